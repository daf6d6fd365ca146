use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting. Job-level variants are caught at the job boundary and turned
/// into progress-report lines; they never abort sibling jobs.
#[derive(Error, Debug)]
pub enum AppError {
    /// The target is a live broadcast and cannot be downloaded
    #[error("live streams cannot be downloaded")]
    Unplayable,

    /// Metadata extraction yielded nothing
    #[error("could not fetch video information")]
    NotFound,

    /// The extractor reported a failure while probing metadata
    #[error("extractor error: {0}")]
    Extraction(String),

    /// yt-dlp reported a failure while materializing the file
    #[error("download error: {0}")]
    Download(String),

    /// The extractor reported success but the scratch directory is empty
    #[error("no file was produced by the download")]
    NoFileProduced,

    /// The produced file exceeds the delivery size ceiling
    #[error("file size ({size_mib} MiB) exceeds the 2000 MiB limit")]
    SizeLimit { size_mib: u64 },

    /// Transport failure while sending the file to the chat
    #[cfg(feature = "telegram")]
    #[error("delivery error: {0}")]
    Delivery(#[from] teloxide::RequestError),

    /// Unrecognized inline-button payload
    #[error("unknown callback payload: {0}")]
    UnknownCallback(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Malformed JSON from the extractor
    #[error("extractor JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anyhow errors (for general error handling)
    #[error("application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Helper conversion so subprocess glue can bubble plain messages
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Download(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Download(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_display_mentions_ceiling() {
        let err = AppError::SizeLimit { size_mib: 2300 };
        let text = err.to_string();
        assert!(text.contains("2300"));
        assert!(text.contains("2000"));
    }

    #[test]
    fn test_from_string_becomes_download() {
        let err: AppError = "boom".into();
        assert!(matches!(err, AppError::Download(_)));
    }
}
