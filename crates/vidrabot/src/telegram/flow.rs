//! Single-item download flow: one status message walked through
//! downloading → uploading → done/failed, then the file itself.

use teloxide::prelude::*;
use teloxide::types::{Message, MessageId};
use tokio_util::sync::CancellationToken;

use vidracore::error::{AppError, AppResult};
use vidracore::fetch::{FetchedFile, MediaSource};
use vidracore::progress::truncate_reason;
use vidracore::quality::Quality;
use vidracore::resolve::PlayableItem;
use vidracore::scratch::ScratchDir;

use crate::telegram::deliver::deliver;
use crate::telegram::Bot;

/// The message that carries download status for one flow.
///
/// Quality menus arrive attached either to a plain text message or to the
/// thumbnail photo; photos can only have their caption edited. When an
/// edit fails (message deleted, too old) we fall back to a fresh message
/// and keep editing that one.
#[derive(Debug)]
pub struct StatusMessage {
    chat_id: ChatId,
    message_id: MessageId,
    edits_caption: bool,
}

impl StatusMessage {
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            message_id: msg.id,
            edits_caption: msg.photo().is_some_and(|p| !p.is_empty()),
        }
    }

    pub fn from_parts(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
            edits_caption: false,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Replace the status text, falling back to a new message when the
    /// edit is rejected.
    pub async fn set(&mut self, bot: &Bot, text: &str) {
        let edit_result = if self.edits_caption {
            bot.edit_message_caption(self.chat_id, self.message_id)
                .caption(text.to_string())
                .await
        } else {
            bot.edit_message_text(self.chat_id, self.message_id, text.to_string()).await
        };

        if let Err(e) = edit_result {
            log::warn!("Status edit failed ({}), sending a new message", e);
            match bot.send_message(self.chat_id, text.to_string()).await {
                Ok(msg) => {
                    self.message_id = msg.id;
                    self.edits_caption = false;
                }
                Err(e) => log::error!("Failed to send replacement status message: {}", e),
            }
        }
    }
}

/// Fetch one item and deliver it, reporting through `status`.
///
/// Every outcome ends in a terminal status edit; errors never escape to
/// the dispatcher. The scratch directory is removed whichever way this
/// returns.
pub async fn run_single_download(
    bot: &Bot,
    chat_id: ChatId,
    status: &mut StatusMessage,
    source: &dyn MediaSource,
    item: &PlayableItem,
    quality: Quality,
    cancel: CancellationToken,
) {
    let downloading = match quality {
        Quality::AudioOnly => "⏳ Downloading audio...".to_string(),
        Quality::Resolution(h) => format!("⏳ Downloading {}p video...", h),
    };
    status.set(bot, &downloading).await;

    match fetch_and_deliver(bot, chat_id, status, source, item, quality, &cancel).await {
        Ok(()) => status.set(bot, "✅ Download complete!").await,
        Err(_) if cancel.is_cancelled() => status.set(bot, "Download canceled.").await,
        Err(e) => {
            log::error!("Download failed for {}: {}", item.url, e);
            status
                .set(bot, &format!("❌ Download failed: {}", truncate_reason(&e.to_string())))
                .await;
        }
    }
}

async fn fetch_and_deliver(
    bot: &Bot,
    chat_id: ChatId,
    status: &mut StatusMessage,
    source: &dyn MediaSource,
    item: &PlayableItem,
    quality: Quality,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let scratch = ScratchDir::create()?;

    let fetched: FetchedFile = tokio::select! {
        _ = cancel.cancelled() => return Err(AppError::Download("canceled".to_string())),
        result = source.fetch(item, quality, &scratch) => result?,
    };

    if cancel.is_cancelled() {
        return Err(AppError::Download("canceled".to_string()));
    }

    status
        .set(bot, &format!("⏳ Uploading ({:.1} MB)...", fetched.size_mib()))
        .await;

    let suffix = match quality {
        Quality::AudioOnly => " (Audio)".to_string(),
        Quality::Resolution(h) => format!(" ({}p)", h),
    };
    deliver(bot, chat_id, &fetched, quality, &suffix).await
}
