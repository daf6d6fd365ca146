//! End-to-end wiring of the playlist menus: stored session → rendered
//! keyboard → parsed payload → entry lookup. No network involved.

use teloxide::types::ChatId;

use vidra::session::{SessionStore, StoredPlaylist};
use vidra::telegram::callback::{CallbackAction, PlaylistAction};
use vidra::telegram::keyboard::{playlist_keyboard, select_keyboard};
use vidracore::quality::Quality;
use vidracore::resolve::PlayableItem;

fn sample_playlist(n: usize) -> StoredPlaylist {
    StoredPlaylist {
        title: "Road Trip Mix".to_string(),
        url: "https://www.youtube.com/playlist?list=PLabc".to_string(),
        entries: (0..n)
            .map(|i| PlayableItem {
                id: format!("vid{:03}", i),
                url: format!("https://www.youtube.com/watch?v=vid{:03}", i),
                title: format!("Track {}", i + 1),
                uploader: "Some Channel".to_string(),
                duration_secs: 200 + i as u64,
                thumbnail_url: None,
            })
            .collect(),
    }
}

#[test]
fn playlist_keyboard_payloads_parse_back_to_their_actions() {
    let store = SessionStore::new();
    let chat = ChatId(42);
    let sid = store.store_playlist(chat, sample_playlist(7));

    let markup = playlist_keyboard(sid);
    let mut actions = Vec::new();
    for button in markup.inline_keyboard.iter().flatten() {
        if let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind {
            actions.push(CallbackAction::parse(data).unwrap());
        }
    }

    assert_eq!(
        actions,
        vec![
            CallbackAction::Playlist {
                action: PlaylistAction::All,
                sid
            },
            CallbackAction::Playlist {
                action: PlaylistAction::First5,
                sid
            },
            CallbackAction::Playlist {
                action: PlaylistAction::Audio,
                sid
            },
            CallbackAction::Playlist {
                action: PlaylistAction::Select,
                sid
            },
        ]
    );
}

#[test]
fn select_keyboard_rows_resolve_to_stored_entries() {
    let store = SessionStore::new();
    let chat = ChatId(42);
    let playlist = sample_playlist(500);
    let sid = store.store_playlist(chat, playlist);
    let stored = store.playlist(chat, sid).unwrap();

    let markup = select_keyboard(sid, &stored.entries);
    assert_eq!(markup.inline_keyboard.len(), 30);

    // Every quality button in every row must point at a real entry.
    for row in &markup.inline_keyboard {
        for button in &row[1..] {
            let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
                panic!("expected callback button");
            };
            match CallbackAction::parse(data).unwrap() {
                CallbackAction::PlaylistVideo { sid: s, index, quality } => {
                    assert_eq!(s, sid);
                    assert!(matches!(
                        quality,
                        Quality::Resolution(720) | Quality::AudioOnly
                    ));
                    let item = store.entry(chat, s, index).unwrap();
                    assert_eq!(item.id, format!("vid{:03}", index));
                }
                other => panic!("unexpected action {:?}", other),
            }
        }
    }
}

#[test]
fn expired_sessions_yield_no_entries() {
    let store = SessionStore::new();
    // Nothing stored for this chat at all.
    assert!(store.playlist(ChatId(1), 0).is_none());
    assert!(store.entry(ChatId(1), 0, 0).is_none());
}
