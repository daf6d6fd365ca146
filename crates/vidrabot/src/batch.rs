//! Bulk playlist actions: many fetch+deliver pipelines reporting into a
//! single status message.
//!
//! Jobs run five at a time; a batch must settle completely before the
//! next one starts. Each job owns its scratch directory and converts its
//! own failure into a report line — siblings and later batches are never
//! affected. All report edits go through one `BatchReporter` whose mutex
//! stays held across the render-and-edit step, so concurrent completions
//! cannot clobber each other's lines.

use std::ops::Range;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use vidracore::batch::{job_label, run_batches};
use vidracore::config;
use vidracore::error::{AppError, AppResult};
use vidracore::fetch::MediaSource;
use vidracore::progress::{truncate_reason, BatchReport, JobState};
use vidracore::quality::Quality;
use vidracore::resolve::PlayableItem;
use vidracore::scratch::ScratchDir;

use crate::session::{CancelRegistry, StoredPlaylist};
use crate::telegram::deliver::deliver;
use crate::telegram::Bot;

/// The three bulk download actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    All,
    First5,
    AudioAll,
}

impl BulkAction {
    pub fn title(self) -> &'static str {
        match self {
            BulkAction::All => "Download All",
            BulkAction::First5 => "First 5",
            BulkAction::AudioAll => "Audio Only",
        }
    }

    pub fn quality(self) -> Quality {
        match self {
            BulkAction::AudioAll => Quality::AudioOnly,
            BulkAction::All | BulkAction::First5 => Quality::Resolution(config::batch::DEFAULT_HEIGHT),
        }
    }

    /// How many playlist entries this action covers.
    pub fn item_count(self, playlist_len: usize) -> usize {
        match self {
            BulkAction::First5 => playlist_len.min(config::batch::FIRST_N),
            BulkAction::All | BulkAction::AudioAll => playlist_len,
        }
    }
}

/// Owns the status message of one bulk action and serializes its updates.
struct BatchReporter {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    base_header: String,
    report: Mutex<BatchReport>,
}

impl BatchReporter {
    async fn create(
        bot: &Bot,
        chat_id: ChatId,
        header: String,
        labels: &[String],
    ) -> Result<Arc<Self>, teloxide::RequestError> {
        let msg = bot.send_message(chat_id, header.clone()).await?;
        Ok(Arc::new(Self {
            bot: bot.clone(),
            chat_id,
            message_id: msg.id,
            base_header: header.clone(),
            report: Mutex::new(BatchReport::new(header, labels)),
        }))
    }

    async fn announce_batch(&self, batch_index: usize, range: Range<usize>) {
        let mut report = self.report.lock().await;
        report.set_header(format!(
            "{}\n▶️ Batch {}: items {}–{}",
            self.base_header,
            batch_index + 1,
            range.start + 1,
            range.end
        ));
        self.push(&report).await;
    }

    async fn transition(&self, label: &str, state: JobState) {
        let mut report = self.report.lock().await;
        if report.update(label, state) {
            self.push(&report).await;
        }
    }

    async fn finish(&self) {
        let mut report = self.report.lock().await;
        let (completed, failed) = report.tallies();
        report.set_header(format!("{}\nDone: ✅ {} · ❌ {}", self.base_header, completed, failed));
        self.push(&report).await;
    }

    async fn push(&self, report: &BatchReport) {
        if let Err(e) = self
            .bot
            .edit_message_text(self.chat_id, self.message_id, report.render())
            .await
        {
            log::warn!("Progress edit failed: {}", e);
        }
    }
}

/// Run one bulk action over a stored playlist.
pub async fn run_bulk_download(
    bot: &Bot,
    chat_id: ChatId,
    source: Arc<dyn MediaSource>,
    cancels: &CancelRegistry,
    playlist: Arc<StoredPlaylist>,
    action: BulkAction,
) -> Result<(), teloxide::RequestError> {
    let items: Vec<PlayableItem> = playlist
        .entries
        .iter()
        .take(action.item_count(playlist.entries.len()))
        .cloned()
        .collect();
    let quality = action.quality();
    let total = items.len();
    let labels: Vec<String> = (0..total).map(|i| job_label(i, total)).collect();

    log::info!(
        "Bulk action {:?} on \"{}\": {} items at {}",
        action,
        playlist.title,
        total,
        quality
    );

    let header = format!("📥 {} — {}\nVideos: {}", action.title(), playlist.title, total);
    let reporter = BatchReporter::create(bot, chat_id, header, &labels).await?;
    let batch_cancel = cancels.token_for(chat_id).child_token();

    let bot = bot.clone();
    run_batches(
        items,
        config::batch::SIZE,
        |batch_index, range| {
            let reporter = Arc::clone(&reporter);
            async move {
                reporter.announce_batch(batch_index, range).await;
            }
        },
        |index, item| {
            let reporter = Arc::clone(&reporter);
            let source = Arc::clone(&source);
            let bot = bot.clone();
            let cancel = batch_cancel.clone();
            let label = job_label(index, total);
            async move {
                run_job(&bot, chat_id, &reporter, source.as_ref(), &item, quality, &label, cancel).await;
            }
        },
    )
    .await;

    reporter.finish().await;
    Ok(())
}

/// One job: fetch into a private scratch directory, gate on size, upload.
/// Failures become report lines; nothing propagates to siblings.
#[allow(clippy::too_many_arguments)]
async fn run_job(
    bot: &Bot,
    chat_id: ChatId,
    reporter: &BatchReporter,
    source: &dyn MediaSource,
    item: &PlayableItem,
    quality: Quality,
    label: &str,
    cancel: CancellationToken,
) {
    reporter.transition(label, JobState::Downloading).await;

    match job_pipeline(bot, chat_id, reporter, source, item, quality, label, &cancel).await {
        Ok(()) => reporter.transition(label, JobState::Completed).await,
        Err(e) => {
            let reason = if cancel.is_cancelled() {
                "canceled".to_string()
            } else {
                log::error!("Job {} failed for {}: {}", label, item.url, e);
                truncate_reason(&e.to_string())
            };
            reporter.transition(label, JobState::Failed { reason }).await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn job_pipeline(
    bot: &Bot,
    chat_id: ChatId,
    reporter: &BatchReporter,
    source: &dyn MediaSource,
    item: &PlayableItem,
    quality: Quality,
    label: &str,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let scratch = ScratchDir::create()?;

    let fetched = tokio::select! {
        _ = cancel.cancelled() => return Err(AppError::Download("canceled".to_string())),
        result = source.fetch(item, quality, &scratch) => result?,
    };

    if cancel.is_cancelled() {
        return Err(AppError::Download("canceled".to_string()));
    }

    reporter
        .transition(
            label,
            JobState::Uploading {
                size_mib: fetched.size_mib(),
            },
        )
        .await;

    deliver(bot, chat_id, &fetched, quality, &format!(" {}", label)).await
}
