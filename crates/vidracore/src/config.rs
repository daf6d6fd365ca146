use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Scratch directory root for per-download working directories
/// Read from TEMP_FILES_DIR environment variable, defaults to /tmp
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Self-hosted Bot API server URL. The default hosted API caps uploads at
/// 50 MB; the 2000 MiB ceiling below assumes a local server.
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: vidra.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "vidra.log".to_string()));

/// Download configuration
pub mod download {
    use super::Duration;

    /// Largest file the delivery step will accept (2000 MiB)
    pub const MAX_FILE_SIZE_BYTES: u64 = 2000 * 1024 * 1024;

    /// Socket timeout passed to yt-dlp (seconds)
    pub const SOCKET_TIMEOUT_SECS: u32 = 30;

    /// Whole-item retry count passed to yt-dlp
    pub const RETRIES: u32 = 3;

    /// Per-fragment retry count passed to yt-dlp
    pub const FRAGMENT_RETRIES: u32 = 3;

    /// Concurrent fragment transfers per item
    pub const CONCURRENT_FRAGMENTS: u32 = 10;

    /// Sustained transfer-rate cap (bytes/sec) to avoid saturating the host
    pub const THROTTLED_RATE: u64 = 100_000;

    /// Target bitrate for audio extraction (kbps)
    pub const AUDIO_BITRATE_KBPS: u32 = 192;

    /// Container for merged video output
    pub const MERGE_OUTPUT_FORMAT: &str = "mp4";

    /// Wall-clock timeout for a single yt-dlp invocation
    pub const YTDLP_TIMEOUT_SECS: u64 = 1800;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Metadata probing configuration
pub mod probe {
    use super::Duration;

    /// Timeout for metadata-only yt-dlp calls (no media transfer)
    pub const TIMEOUT_SECS: u64 = 120;

    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Quality-menu construction rules
pub mod resolve {
    /// Smallest height offered to the user
    pub const MIN_HEIGHT: u32 = 480;

    /// Largest height offered to the user
    pub const MAX_HEIGHT: u32 = 2160;

    /// Offered when stream discovery yields nothing usable
    pub const FALLBACK_HEIGHTS: [u32; 3] = [1080, 720, 480];
}

/// Batch download configuration
pub mod batch {
    /// Jobs launched concurrently within one batch
    pub const SIZE: usize = 5;

    /// Item count for the "first N" bulk action
    pub const FIRST_N: usize = 5;

    /// Row cap for the per-item selection menu
    pub const SELECT_MAX_ITEMS: usize = 30;

    /// Default resolution for bulk video downloads
    pub const DEFAULT_HEIGHT: u32 = 720;
}

/// Network configuration for the Telegram client
pub mod network {
    use super::Duration;

    /// Request timeout; uploads near the size ceiling take a while even
    /// against a local Bot API server
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Reasons shown in chat are clipped; full detail goes to the log only
pub const MAX_CHAT_REASON_CHARS: usize = 100;
