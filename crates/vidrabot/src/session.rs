//! Per-chat state: resolved playlists and cancellation handles.
//!
//! Playlists are addressed from inline buttons by a short numeric id so
//! the original URL never has to fit inside a 64-byte callback payload.
//! Ids come from a per-chat monotonically increasing counter, so two
//! playlists active in the same chat can never collide. Nothing here is
//! persisted; a restart forgets all of it.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio_util::sync::CancellationToken;

use vidracore::resolve::PlayableItem;

/// A playlist resolved for one chat, addressable by short id.
#[derive(Debug)]
pub struct StoredPlaylist {
    pub title: String,
    pub url: String,
    pub entries: Vec<PlayableItem>,
}

#[derive(Debug, Default)]
struct ChatSession {
    next_id: u64,
    playlists: HashMap<u64, Arc<StoredPlaylist>>,
}

/// Per-chat playlist store.
#[derive(Debug, Default)]
pub struct SessionStore {
    chats: DashMap<ChatId, ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a playlist and return the short id buttons will carry.
    pub fn store_playlist(&self, chat_id: ChatId, playlist: StoredPlaylist) -> u64 {
        let mut session = self.chats.entry(chat_id).or_default();
        let sid = session.next_id;
        session.next_id += 1;
        session.playlists.insert(sid, Arc::new(playlist));
        sid
    }

    pub fn playlist(&self, chat_id: ChatId, sid: u64) -> Option<Arc<StoredPlaylist>> {
        self.chats.get(&chat_id)?.playlists.get(&sid).cloned()
    }

    /// One playlist member by (short id, entry index).
    pub fn entry(&self, chat_id: ChatId, sid: u64, index: usize) -> Option<PlayableItem> {
        self.playlist(chat_id, sid)?.entries.get(index).cloned()
    }
}

/// Per-chat cancellation handles.
///
/// Each chat has one root token; batches derive child tokens from it and
/// every job observes its token at suspension points, so /cancel stops
/// outstanding work cooperatively instead of only the umbrella wait.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    tokens: DashMap<ChatId, CancellationToken>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chat's current root token, created on first use.
    pub fn token_for(&self, chat_id: ChatId) -> CancellationToken {
        self.tokens.entry(chat_id).or_default().clone()
    }

    /// Cancel everything running for this chat. Returns false when there
    /// was nothing to cancel. The next `token_for` starts a fresh root.
    pub fn cancel(&self, chat_id: ChatId) -> bool {
        match self.tokens.remove(&chat_id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
