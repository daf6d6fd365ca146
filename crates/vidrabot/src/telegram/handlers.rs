//! Dispatcher schema and handlers: commands, URL messages, callbacks.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::InputFile;
use url::Url;

use vidracore::error::AppError;
use vidracore::fetch::{MediaSource, YtDlpSource};
use vidracore::playlist::format_duration;
use vidracore::progress::truncate_reason;
use vidracore::resolve::{self, PlayableItem, QualityOption, ResolvedTarget};

use crate::batch::{run_bulk_download, BulkAction};
use crate::session::{CancelRegistry, SessionStore, StoredPlaylist};
use crate::telegram::bot::Command;
use crate::telegram::callback::{CallbackAction, PlaylistAction};
use crate::telegram::flow::{run_single_download, StatusMessage};
use crate::telegram::keyboard::{playlist_keyboard, quality_keyboard, select_keyboard};
use crate::telegram::Bot;

/// Cached regex for validating video URLs, compiled once at startup.
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((?:https?:)?//)?((?:www|m)\.)?(youtube(-nocookie)?\.com|youtu.be)(/(?:[\w\-]+\?v=|embed/|live/|v/)?)([\w\-]+)(\S+)?$",
    )
    .expect("Failed to compile URL regex")
});

/// Error type flowing out of every handler endpoint.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Shared dependencies handed to every handler branch.
#[derive(Clone)]
pub struct HandlerDeps {
    pub source: Arc<dyn MediaSource>,
    pub sessions: Arc<SessionStore>,
    pub cancels: Arc<CancelRegistry>,
}

impl HandlerDeps {
    pub fn new() -> Self {
        Self {
            source: Arc::new(YtDlpSource::new()),
            sessions: Arc::new(SessionStore::new()),
            cancels: Arc::new(CancelRegistry::new()),
        }
    }
}

impl Default for HandlerDeps {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the main dispatcher schema for the bot.
///
/// The same handler tree serves production and tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let deps = deps_commands.clone();
                    async move { handle_command(bot, msg, cmd, deps).await }
                }),
        )
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let deps = deps_messages.clone();
            async move { handle_message(bot, msg, deps).await }
        }))
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callback.clone();
            async move { handle_callback(bot, q, deps).await }
        }))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, deps: HandlerDeps) -> Result<(), HandlerError> {
    match cmd {
        Command::Start => {
            let name = msg
                .from
                .as_ref()
                .map(|u| u.first_name.clone())
                .unwrap_or_else(|| "there".to_string());
            bot.send_message(
                msg.chat.id,
                format!(
                    "Hi {}! I'm a video downloader bot.\n\n\
                     Send me a video or playlist link and I'll fetch it for you \
                     in your preferred quality.\n\n\
                     Use /help to see all available commands.",
                    name
                ),
            )
            .await?;
        }
        Command::Help => {
            bot.send_message(
                msg.chat.id,
                "📹 Video Downloader Bot\n\n\
                 Commands:\n\
                 /start - Start the bot\n\
                 /help - Show this help message\n\
                 /cancel - Cancel the current download\n\n\
                 How to use:\n\
                 1. Send a video or playlist link\n\
                 2. Pick a quality or a playlist action\n\
                 3. Wait for the download to complete\n\n\
                 Note: files up to 2 GB are supported.",
            )
            .await?;
        }
        Command::Cancel => {
            let reply = if deps.cancels.cancel(msg.chat.id) {
                "Download canceled."
            } else {
                "No active download to cancel."
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
    }
    Ok(())
}

/// Handle a plain message: anything that looks like a supported URL starts
/// the resolve flow; everything else gets a gentle rejection.
async fn handle_message(bot: Bot, msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else { return Ok(()) };
    let text = text.trim();
    if text.is_empty() || text.starts_with('/') {
        return Ok(());
    }

    if !URL_REGEX.is_match(text) {
        bot.send_message(msg.chat.id, "Please send a valid YouTube URL.").await?;
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let status = bot.send_message(chat_id, "⏳ Fetching video information...").await?;
    let mut status = StatusMessage::from_parts(chat_id, status.id);

    let url = match Url::parse(&normalize_url(text)) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Rejected unparseable URL {:?}: {}", text, e);
            status.set(&bot, "Please send a valid YouTube URL.").await;
            return Ok(());
        }
    };

    match resolve::resolve(&url).await {
        Ok(ResolvedTarget::Video { item, options }) => {
            show_quality_menu(&bot, chat_id, &mut status, &item, &options).await;
        }
        Ok(ResolvedTarget::Playlist(info)) => {
            let count = info.entries.len();
            let title = info.title.clone();
            let sid = deps.sessions.store_playlist(
                chat_id,
                StoredPlaylist {
                    title: info.title,
                    url: url.to_string(),
                    entries: info.entries,
                },
            );
            status
                .set(&bot, &format!("📃 {}\n\nVideos: {}\n\nChoose an action:", title, count))
                .await;
            bot.edit_message_reply_markup(chat_id, status.message_id())
                .reply_markup(playlist_keyboard(sid))
                .await
                .ok();
        }
        Err(e) => {
            status.set(&bot, &resolve_error_text(&e)).await;
        }
    }

    Ok(())
}

fn resolve_error_text(err: &AppError) -> String {
    match err {
        AppError::Unplayable => "❌ Cannot download live streams.".to_string(),
        AppError::NotFound => "❌ Could not fetch video information.".to_string(),
        other => format!(
            "❌ Error processing video. Please try again. Error: {}",
            truncate_reason(&other.to_string())
        ),
    }
}

/// Present the quality menu, preferably on top of the video thumbnail.
async fn show_quality_menu(
    bot: &Bot,
    chat_id: ChatId,
    status: &mut StatusMessage,
    item: &PlayableItem,
    options: &[QualityOption],
) {
    let keyboard = quality_keyboard(options, &item.url);
    let caption = format!(
        "{}\n\nDuration: {}\nChannel: {}\n\nSelect video quality:",
        item.title,
        format_duration(item.duration_secs),
        item.uploader
    );

    if let Some(thumb) = item.thumbnail_url.as_ref().and_then(|t| Url::parse(t).ok()) {
        let sent = bot
            .send_photo(chat_id, InputFile::url(thumb))
            .caption(caption.clone())
            .reply_markup(keyboard.clone())
            .await;
        match sent {
            Ok(_) => {
                bot.delete_message(chat_id, status.message_id()).await.ok();
                return;
            }
            Err(e) => log::warn!("Thumbnail send failed, falling back to text: {}", e),
        }
    }

    status.set(bot, &caption).await;
    bot.edit_message_reply_markup(chat_id, status.message_id())
        .reply_markup(keyboard)
        .await
        .ok();
}

async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let chat_id = match q.message.as_ref() {
        Some(msg) => msg.chat().id,
        None => ChatId(i64::try_from(q.from.id.0).unwrap_or_default()),
    };

    let action = match CallbackAction::parse(&data) {
        Ok(action) => action,
        Err(e) => {
            // Acknowledge and bail; unknown payloads must not mutate state.
            log::warn!("Unrecognized callback from chat {}: {}", chat_id, e);
            bot.answer_callback_query(q.id).text("Unknown action").await?;
            return Ok(());
        }
    };

    match action {
        CallbackAction::Quality { quality, url } => {
            bot.answer_callback_query(q.id).await?;
            let mut status = match q.message.as_ref().and_then(|m| m.regular_message()) {
                Some(msg) => StatusMessage::from_message(msg),
                None => {
                    let msg = bot.send_message(chat_id, "Processing your request...").await?;
                    StatusMessage::from_parts(chat_id, msg.id)
                }
            };

            let parsed = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::error!("Callback carried an invalid URL {:?}: {}", url, e);
                    status.set(&bot, "❌ Could not fetch video information.").await;
                    return Ok(());
                }
            };

            // Re-probe for metadata; the button payload only has room for
            // the URL itself.
            match resolve::resolve(&parsed).await {
                Ok(ResolvedTarget::Video { item, .. }) => {
                    let cancel = deps.cancels.token_for(chat_id);
                    run_single_download(&bot, chat_id, &mut status, deps.source.as_ref(), &item, quality, cancel)
                        .await;
                }
                Ok(ResolvedTarget::Playlist(_)) => {
                    status.set(&bot, "❌ Could not fetch video information.").await;
                }
                Err(e) => {
                    status.set(&bot, &resolve_error_text(&e)).await;
                }
            }
        }

        CallbackAction::Playlist { action, sid } => {
            bot.answer_callback_query(q.id).await?;
            let Some(playlist) = deps.sessions.playlist(chat_id, sid) else {
                bot.send_message(chat_id, "⚠️ This playlist menu has expired. Send the link again.")
                    .await?;
                return Ok(());
            };

            match action {
                PlaylistAction::Select => {
                    bot.send_message(chat_id, format!("☑️ {} — pick videos:", playlist.title))
                        .reply_markup(select_keyboard(sid, &playlist.entries))
                        .await?;
                }
                PlaylistAction::All => {
                    run_bulk_download(&bot, chat_id, Arc::clone(&deps.source), &deps.cancels, playlist, BulkAction::All)
                        .await?;
                }
                PlaylistAction::First5 => {
                    run_bulk_download(
                        &bot,
                        chat_id,
                        Arc::clone(&deps.source),
                        &deps.cancels,
                        playlist,
                        BulkAction::First5,
                    )
                    .await?;
                }
                PlaylistAction::Audio => {
                    run_bulk_download(
                        &bot,
                        chat_id,
                        Arc::clone(&deps.source),
                        &deps.cancels,
                        playlist,
                        BulkAction::AudioAll,
                    )
                    .await?;
                }
            }
        }

        CallbackAction::PlaylistVideo { sid, index, quality } => {
            bot.answer_callback_query(q.id).await?;
            let Some(item) = deps.sessions.entry(chat_id, sid, index) else {
                bot.send_message(chat_id, "⚠️ This playlist menu has expired. Send the link again.")
                    .await?;
                return Ok(());
            };
            let msg = bot.send_message(chat_id, format!("⏳ {}", item.title)).await?;
            let mut status = StatusMessage::from_parts(chat_id, msg.id);
            let cancel = deps.cancels.token_for(chat_id);
            run_single_download(&bot, chat_id, &mut status, deps.source.as_ref(), &item, quality, cancel).await;
        }

        CallbackAction::VideoInfo { sid, index } => {
            match deps.sessions.entry(chat_id, sid, index) {
                Some(item) => {
                    bot.answer_callback_query(q.id)
                        .text(format!(
                            "{} · {} · {}",
                            item.title,
                            item.uploader,
                            format_duration(item.duration_secs)
                        ))
                        .await?;
                }
                None => {
                    bot.answer_callback_query(q.id).await?;
                }
            }
        }
    }

    Ok(())
}

/// The regex accepts scheme-less URLs; give those a scheme so `Url::parse`
/// accepts them too.
fn normalize_url(text: &str) -> String {
    if text.starts_with("http://") || text.starts_with("https://") {
        text.to_string()
    } else {
        format!("https://{}", text.trim_start_matches("//"))
    }
}
