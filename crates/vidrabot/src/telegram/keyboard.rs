//! Inline keyboard construction.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use vidracore::config;
use vidracore::quality::Quality;
use vidracore::resolve::{PlayableItem, QualityOption};

use crate::telegram::callback::{CallbackAction, PlaylistAction};
use crate::telegram::cb;

/// Quality picker for a single video: one button per offered resolution
/// plus the audio option, arranged in rows of 2.
pub fn quality_keyboard(options: &[QualityOption], url: &str) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = options
        .iter()
        .map(|option| match option {
            QualityOption::Resolution {
                height,
                approx_size_bytes,
            } => {
                let label = match approx_size_bytes {
                    Some(bytes) => format!("{}p (~{:.1}MB)", height, *bytes as f64 / (1024.0 * 1024.0)),
                    None => format!("{}p", height),
                };
                let data = CallbackAction::Quality {
                    quality: Quality::Resolution(*height),
                    url: url.to_string(),
                }
                .encode();
                cb(label, data)
            }
            QualityOption::AudioOnly => {
                let data = CallbackAction::Quality {
                    quality: Quality::AudioOnly,
                    url: url.to_string(),
                }
                .encode();
                cb("Audio Only", data)
            }
        })
        .collect();

    InlineKeyboardMarkup::new(buttons.chunks(2).map(|row| row.to_vec()))
}

/// Bulk-action menu shown when a playlist resolves.
pub fn playlist_keyboard(sid: u64) -> InlineKeyboardMarkup {
    let row = |action: PlaylistAction, label: &str| cb(label, CallbackAction::Playlist { action, sid }.encode());
    InlineKeyboardMarkup::new(vec![
        vec![
            row(PlaylistAction::All, "⬇️ Download All"),
            row(PlaylistAction::First5, "5️⃣ First 5"),
        ],
        vec![
            row(PlaylistAction::Audio, "🎵 Audio Only"),
            row(PlaylistAction::Select, "☑️ Choose Videos"),
        ],
    ])
}

/// Per-item selection menu: one row per playlist entry, capped at the
/// configured row limit however long the playlist is.
pub fn select_keyboard(sid: u64, entries: &[PlayableItem]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .take(config::batch::SELECT_MAX_ITEMS)
        .enumerate()
        .map(|(index, item)| {
            vec![
                cb(
                    format!("{}. {}", index + 1, truncate_title(&item.title, 24)),
                    CallbackAction::VideoInfo { sid, index }.encode(),
                ),
                cb(
                    format!("{}p", config::batch::DEFAULT_HEIGHT),
                    CallbackAction::PlaylistVideo {
                        sid,
                        index,
                        quality: Quality::Resolution(config::batch::DEFAULT_HEIGHT),
                    }
                    .encode(),
                ),
                cb(
                    "🎵",
                    CallbackAction::PlaylistVideo {
                        sid,
                        index,
                        quality: Quality::AudioOnly,
                    }
                    .encode(),
                ),
            ]
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut out: String = title.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(i: usize) -> PlayableItem {
        PlayableItem {
            id: format!("vid{}", i),
            url: format!("https://www.youtube.com/watch?v=vid{}", i),
            title: format!("Video number {}", i),
            uploader: "Chan".to_string(),
            duration_secs: 90,
            thumbnail_url: None,
        }
    }

    fn all_labels(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect()
    }

    #[test]
    fn test_quality_keyboard_rows_of_two() {
        let options = vec![
            QualityOption::Resolution {
                height: 1080,
                approx_size_bytes: Some(52_428_800),
            },
            QualityOption::Resolution {
                height: 720,
                approx_size_bytes: None,
            },
            QualityOption::AudioOnly,
        ];
        let markup = quality_keyboard(&options, "https://youtu.be/abc");
        let rows: Vec<usize> = markup.inline_keyboard.iter().map(|r| r.len()).collect();
        assert_eq!(rows, vec![2, 1]);
        assert_eq!(all_labels(&markup), vec!["1080p (~50.0MB)", "720p", "Audio Only"]);
    }

    #[test]
    fn test_quality_keyboard_audio_button_appears_once() {
        let options = vec![QualityOption::Resolution { height: 480, approx_size_bytes: None }, QualityOption::AudioOnly];
        let markup = quality_keyboard(&options, "https://youtu.be/abc");
        let audio_buttons = all_labels(&markup).iter().filter(|l| *l == "Audio Only").count();
        assert_eq!(audio_buttons, 1);
    }

    #[test]
    fn test_select_keyboard_caps_rows_at_thirty() {
        let entries: Vec<PlayableItem> = (0..500).map(item).collect();
        let markup = select_keyboard(0, &entries);
        assert_eq!(markup.inline_keyboard.len(), 30);
    }

    #[test]
    fn test_select_keyboard_rows_carry_info_and_both_qualities() {
        let entries = vec![item(0)];
        let markup = select_keyboard(3, &entries);
        let row = &markup.inline_keyboard[0];
        assert_eq!(row.len(), 3);
        assert!(row[0].text.starts_with("1. "));
    }

    #[test]
    fn test_playlist_keyboard_has_four_actions() {
        let markup = playlist_keyboard(1);
        assert_eq!(all_labels(&markup).len(), 4);
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short", 24), "short");
        let long = "a very long title that keeps going and going";
        let truncated = truncate_title(long, 24);
        assert_eq!(truncated.chars().count(), 24);
        assert!(truncated.ends_with('…'));
    }
}
