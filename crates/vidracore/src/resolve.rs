//! Resolver: turns a user-supplied URL into a playable target.
//!
//! A URL resolves either to a single video (with the quality menu the user
//! will pick from) or to a playlist of entries for the batch actions.
//! Read-only: nothing is downloaded here.

use serde::Deserialize;
use std::collections::HashSet;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::playlist::{self, PlaylistInfo};
use crate::process::run_with_timeout;

/// One resolvable video/audio target with stable identity and metadata.
/// Immutable after creation; lives only for the handling of one request.
#[derive(Debug, Clone)]
pub struct PlayableItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub uploader: String,
    pub duration_secs: u64,
    pub thumbnail_url: Option<String>,
}

/// One entry of the quality menu offered for a single video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityOption {
    Resolution {
        height: u32,
        /// Reported stream size, when the extractor knows it
        approx_size_bytes: Option<u64>,
    },
    AudioOnly,
}

/// Outcome of resolving a URL.
#[derive(Debug)]
pub enum ResolvedTarget {
    Video {
        item: PlayableItem,
        options: Vec<QualityOption>,
    },
    Playlist(PlaylistInfo),
}

/// JSON structure from yt-dlp --dump-single-json (the fields we read)
#[derive(Debug, Deserialize)]
struct ProbeJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize, Default)]
struct FormatJson {
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
}

impl FormatJson {
    fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|v| v != "none")
    }

    fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|a| a != "none")
    }

    fn size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }
}

/// Resolve a URL into a single video or a playlist.
pub async fn resolve(url: &Url) -> AppResult<ResolvedTarget> {
    if playlist::is_playlist_url(url) {
        let info = playlist::extract_playlist(url).await?;
        return Ok(ResolvedTarget::Playlist(info));
    }
    probe_video(url).await
}

/// Probe a single video's metadata without downloading anything.
async fn probe_video(url: &Url) -> AppResult<ResolvedTarget> {
    let ytdl_bin = &*config::YTDL_BIN;
    let socket_timeout = config::download::SOCKET_TIMEOUT_SECS.to_string();

    let args: Vec<&str> = vec![
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
        "--quiet",
        "--no-warnings",
        "--socket-timeout",
        &socket_timeout,
        url.as_str(),
    ];

    log::info!("Probing video metadata: {}", url);

    let mut cmd = Command::new(ytdl_bin);
    cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = run_with_timeout(&mut cmd, config::probe::timeout()).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("yt-dlp probe failed for {}: {}", url, stderr);
        return Err(AppError::Extraction(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Err(AppError::NotFound);
    }

    let info: ProbeJson = serde_json::from_str(stdout.trim())?;

    if info.is_live.unwrap_or(false) {
        return Err(AppError::Unplayable);
    }

    let id = info.id.ok_or(AppError::NotFound)?;

    let item = PlayableItem {
        id,
        url: info.webpage_url.unwrap_or_else(|| url.to_string()),
        title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
        uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
        duration_secs: info.duration.map(|d| d as u64).unwrap_or(0),
        thumbnail_url: info.thumbnail,
    };

    let options = quality_options(&info.formats);

    log::info!(
        "Resolved \"{}\" with {} quality options",
        item.title,
        options.len()
    );

    Ok(ResolvedTarget::Video { item, options })
}

/// Build the quality menu from the extractor's format list.
///
/// Combined audio+video streams are preferred; with none present we fall
/// back to video-only streams of at least 480p (the fetch step muxes audio
/// separately). Heights are deduplicated, clamped to [480, 2160] and sorted
/// descending. An empty result synthesizes the fixed fallback set. The
/// audio-only entry is always appended last.
fn quality_options(formats: &[FormatJson]) -> Vec<QualityOption> {
    let mut candidates: Vec<&FormatJson> = formats
        .iter()
        .filter(|f| f.has_video() && f.has_audio() && f.height.is_some())
        .collect();

    if candidates.is_empty() {
        candidates = formats
            .iter()
            .filter(|f| {
                f.has_video() && f.height.is_some_and(|h| h >= config::resolve::MIN_HEIGHT)
            })
            .collect();
    }

    candidates.sort_by(|a, b| b.height.cmp(&a.height));

    let mut seen: HashSet<u32> = HashSet::new();
    let mut options: Vec<QualityOption> = Vec::new();

    for f in candidates {
        let Some(height) = f.height else { continue };
        if !(config::resolve::MIN_HEIGHT..=config::resolve::MAX_HEIGHT).contains(&height) {
            continue;
        }
        if seen.insert(height) {
            options.push(QualityOption::Resolution {
                height,
                approx_size_bytes: f.size(),
            });
        }
    }

    if options.is_empty() {
        log::warn!("No usable video formats reported, offering default resolutions");
        for height in config::resolve::FALLBACK_HEIGHTS {
            options.push(QualityOption::Resolution {
                height,
                approx_size_bytes: None,
            });
        }
    }

    options.push(QualityOption::AudioOnly);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn combined(height: u32, filesize: Option<u64>) -> FormatJson {
        FormatJson {
            vcodec: Some("avc1".to_string()),
            acodec: Some("mp4a".to_string()),
            height: Some(height),
            filesize,
            ..Default::default()
        }
    }

    fn video_only(height: u32) -> FormatJson {
        FormatJson {
            vcodec: Some("vp9".to_string()),
            acodec: Some("none".to_string()),
            height: Some(height),
            ..Default::default()
        }
    }

    fn audio_only() -> FormatJson {
        FormatJson {
            vcodec: Some("none".to_string()),
            acodec: Some("opus".to_string()),
            ..Default::default()
        }
    }

    fn heights(options: &[QualityOption]) -> Vec<u32> {
        options
            .iter()
            .filter_map(|o| match o {
                QualityOption::Resolution { height, .. } => Some(*height),
                QualityOption::AudioOnly => None,
            })
            .collect()
    }

    #[test]
    fn test_options_deduped_and_sorted_descending() {
        let formats = vec![
            combined(480, None),
            combined(1080, Some(50_000_000)),
            combined(720, None),
            combined(1080, Some(48_000_000)),
            audio_only(),
        ];
        let options = quality_options(&formats);
        assert_eq!(heights(&options), vec![1080, 720, 480]);
    }

    #[test]
    fn test_heights_outside_range_never_appear() {
        let formats = vec![
            combined(144, None),
            combined(360, None),
            combined(720, None),
            combined(4320, None),
        ];
        let options = quality_options(&formats);
        assert_eq!(heights(&options), vec![720]);
    }

    #[test]
    fn test_video_only_fallback_when_no_combined_streams() {
        // A 720p video-only stream must still yield a 720p offer; muxing is
        // the fetch step's job.
        let formats = vec![video_only(720), video_only(360), audio_only()];
        let options = quality_options(&formats);
        assert_eq!(heights(&options), vec![720]);
    }

    #[test]
    fn test_fallback_set_when_nothing_qualifies() {
        let options = quality_options(&[audio_only()]);
        assert_eq!(heights(&options), vec![1080, 720, 480]);
        assert_eq!(options.last(), Some(&QualityOption::AudioOnly));
    }

    #[test]
    fn test_audio_only_present_exactly_once_and_last() {
        for formats in [vec![], vec![combined(1080, None)], vec![video_only(480)]] {
            let options = quality_options(&formats);
            let audio_count = options
                .iter()
                .filter(|o| matches!(o, QualityOption::AudioOnly))
                .count();
            assert_eq!(audio_count, 1);
            assert_eq!(options.last(), Some(&QualityOption::AudioOnly));
        }
    }

    #[test]
    fn test_size_carried_from_first_format_at_height() {
        let formats = vec![combined(1080, Some(50_000_000)), combined(1080, Some(10))];
        let options = quality_options(&formats);
        assert_eq!(
            options[0],
            QualityOption::Resolution {
                height: 1080,
                approx_size_bytes: Some(50_000_000)
            }
        );
    }

    #[test]
    fn test_probe_json_parses_minimal_payload() {
        let json = r#"{"id":"abc123","title":"A Video","duration":61.4,"formats":[{"vcodec":"avc1","acodec":"mp4a","height":720}]}"#;
        let info: ProbeJson = serde_json::from_str(json).unwrap();
        assert_eq!(info.id.as_deref(), Some("abc123"));
        assert_eq!(info.duration, Some(61.4));
        assert_eq!(info.formats.len(), 1);
        assert_eq!(info.is_live, None);
    }
}
