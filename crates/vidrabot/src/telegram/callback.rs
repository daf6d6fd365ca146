//! Inline-button payload wire format.
//!
//! Every payload is pipe-separated with a short tag and a fixed field
//! count: `q|<height-or-audio>|<url>`, `pl|<action>|<sid>`,
//! `plv|<sid>|<idx>|<height-or-audio>`, `vi|<sid>|<idx>`. Telegram caps
//! payloads at 64 bytes, which is why playlists travel as short ids and
//! only the single-video pick carries its URL.

use vidracore::error::{AppError, AppResult};
use vidracore::quality::Quality;

/// Bulk action on a resolved playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistAction {
    /// Download every entry, batched
    All,
    /// Download only the first five entries
    First5,
    /// Download every entry as audio, batched
    Audio,
    /// Show the per-item selection menu instead of downloading
    Select,
}

impl PlaylistAction {
    fn as_token(self) -> &'static str {
        match self {
            PlaylistAction::All => "all",
            PlaylistAction::First5 => "first5",
            PlaylistAction::Audio => "audio",
            PlaylistAction::Select => "select",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "all" => Some(PlaylistAction::All),
            "first5" => Some(PlaylistAction::First5),
            "audio" => Some(PlaylistAction::Audio),
            "select" => Some(PlaylistAction::Select),
            _ => None,
        }
    }
}

/// A parsed inline-button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Quality picked for a single video
    Quality { quality: Quality, url: String },
    /// Bulk action on a stored playlist
    Playlist { action: PlaylistAction, sid: u64 },
    /// Quality picked for one playlist entry from the selection menu
    PlaylistVideo { sid: u64, index: usize, quality: Quality },
    /// Informational tap on a playlist entry; mutates nothing
    VideoInfo { sid: u64, index: usize },
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Quality { quality, url } => format!("q|{}|{}", quality.as_token(), url),
            CallbackAction::Playlist { action, sid } => format!("pl|{}|{}", action.as_token(), sid),
            CallbackAction::PlaylistVideo { sid, index, quality } => {
                format!("plv|{}|{}|{}", sid, index, quality.as_token())
            }
            CallbackAction::VideoInfo { sid, index } => format!("vi|{}|{}", sid, index),
        }
    }

    /// Parse a payload; anything unrecognized is `UnknownCallback`.
    pub fn parse(data: &str) -> AppResult<Self> {
        let unknown = || AppError::UnknownCallback(data.to_string());

        let (tag, rest) = data.split_once('|').ok_or_else(unknown)?;
        match tag {
            "q" => {
                let (token, url) = rest.split_once('|').ok_or_else(unknown)?;
                let quality = Quality::parse_token(token).ok_or_else(unknown)?;
                if url.is_empty() {
                    return Err(unknown());
                }
                Ok(CallbackAction::Quality {
                    quality,
                    url: url.to_string(),
                })
            }
            "pl" => {
                let (action, sid) = rest.split_once('|').ok_or_else(unknown)?;
                let action = PlaylistAction::parse_token(action).ok_or_else(unknown)?;
                let sid = sid.parse::<u64>().map_err(|_| unknown())?;
                Ok(CallbackAction::Playlist { action, sid })
            }
            "plv" => {
                let mut fields = rest.splitn(3, '|');
                let sid = fields.next().and_then(|s| s.parse::<u64>().ok()).ok_or_else(unknown)?;
                let index = fields
                    .next()
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(unknown)?;
                let quality = fields
                    .next()
                    .and_then(Quality::parse_token)
                    .ok_or_else(unknown)?;
                Ok(CallbackAction::PlaylistVideo { sid, index, quality })
            }
            "vi" => {
                let (sid, index) = rest.split_once('|').ok_or_else(unknown)?;
                let sid = sid.parse::<u64>().map_err(|_| unknown())?;
                let index = index.parse::<usize>().map_err(|_| unknown())?;
                Ok(CallbackAction::VideoInfo { sid, index })
            }
            _ => Err(unknown()),
        }
    }
}
