//! Item fetcher: materializes one playable item into a scratch directory.
//!
//! The `MediaSource` trait is the seam between the orchestration layers and
//! the actual extractor; `YtDlpSource` is the production implementation.
//! Downloads write to a fixed output stem inside the scratch directory so
//! the produced artifact is located deterministically, not by directory
//! listing order.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::process::run_with_timeout;
use crate::quality::Quality;
use crate::resolve::PlayableItem;
use crate::scratch::ScratchDir;

/// Output stem used for every download inside its scratch directory.
const OUTPUT_STEM: &str = "media";

/// A locally materialized media file, ready for delivery.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub title: String,
    pub uploader: String,
    pub duration_secs: u64,
}

impl FetchedFile {
    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Trait for media fetch backends.
///
/// One implementation talks to yt-dlp; tests substitute their own to
/// exercise the orchestration without touching the network.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Materialize `item` at the requested quality into `scratch`.
    ///
    /// Fails with `Download` (extractor-reported), `NoFileProduced`
    /// (extractor claimed success but left nothing behind) or `SizeLimit`
    /// (artifact exceeds the delivery ceiling).
    async fn fetch(&self, item: &PlayableItem, quality: Quality, scratch: &ScratchDir) -> AppResult<FetchedFile>;
}

/// Fetch backend powered by yt-dlp.
#[derive(Debug, Default)]
pub struct YtDlpSource;

impl YtDlpSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, item: &PlayableItem, quality: Quality, scratch: &ScratchDir) -> AppResult<FetchedFile> {
        let output_tmpl = scratch
            .path()
            .join(format!("{}.%(ext)s", OUTPUT_STEM))
            .to_string_lossy()
            .into_owned();

        let mut args = build_fetch_args(quality, &output_tmpl);
        args.push(item.url.clone());

        log::info!("Downloading \"{}\" as {} into {}", item.title, quality, scratch.path().display());

        let mut cmd = Command::new(&*config::YTDL_BIN);
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());
        let output = run_with_timeout(&mut cmd, config::download::ytdlp_timeout()).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!("yt-dlp download failed for {}: {}", item.url, stderr);
            return Err(AppError::Download(stderr.trim().to_string()));
        }

        let preferred_ext = if quality.is_audio() { "mp3" } else { config::download::MERGE_OUTPUT_FORMAT };
        let path = locate_artifact(scratch.path(), preferred_ext)?.ok_or(AppError::NoFileProduced)?;

        let size_bytes = fs_err::metadata(&path)?.len();
        enforce_size_ceiling(size_bytes)?;

        log::info!(
            "Downloaded \"{}\" -> {} ({} bytes)",
            item.title,
            path.display(),
            size_bytes
        );

        Ok(FetchedFile {
            path,
            size_bytes,
            title: item.title.clone(),
            uploader: item.uploader.clone(),
            duration_secs: item.duration_secs,
        })
    }
}

/// Reject artifacts the transport would refuse. Runs after the fetch and
/// before any delivery attempt.
pub fn enforce_size_ceiling(size_bytes: u64) -> AppResult<()> {
    if size_bytes > config::download::MAX_FILE_SIZE_BYTES {
        return Err(AppError::SizeLimit {
            size_mib: size_bytes / (1024 * 1024),
        });
    }
    Ok(())
}

/// Build the yt-dlp argument vector for one fetch.
fn build_fetch_args(quality: Quality, output_tmpl: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-o".into(),
        output_tmpl.into(),
        "--no-playlist".into(),
        "--quiet".into(),
        "--no-warnings".into(),
        "--geo-bypass".into(),
        "--socket-timeout".into(),
        config::download::SOCKET_TIMEOUT_SECS.to_string(),
        "--retries".into(),
        config::download::RETRIES.to_string(),
        "--fragment-retries".into(),
        config::download::FRAGMENT_RETRIES.to_string(),
        "--concurrent-fragments".into(),
        config::download::CONCURRENT_FRAGMENTS.to_string(),
        "--throttled-rate".into(),
        config::download::THROTTLED_RATE.to_string(),
    ];

    match quality {
        Quality::AudioOnly => {
            args.extend([
                "-f".to_string(),
                "bestaudio/best".to_string(),
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                format!("{}K", config::download::AUDIO_BITRATE_KBPS),
            ]);
        }
        Quality::Resolution(h) => {
            args.extend([
                "-f".to_string(),
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
                "--merge-output-format".to_string(),
                config::download::MERGE_OUTPUT_FORMAT.to_string(),
            ]);
        }
    }

    args
}

/// Locate the produced artifact by its fixed stem.
///
/// The exact container extension depends on what yt-dlp ended up with, so
/// we match on the stem: the preferred container wins, then remaining
/// `media.*` files in name order. Leftover partial-transfer files are
/// never candidates.
fn locate_artifact(dir: &Path, preferred_ext: &str) -> AppResult<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    for entry in fs_err::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".part") || name.ends_with(".ytdl") || name.ends_with(".temp") {
            continue;
        }
        if name == format!("{}.{}", OUTPUT_STEM, preferred_ext) {
            return Ok(Some(path));
        }
        if name.starts_with(&format!("{}.", OUTPUT_STEM)) {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}
