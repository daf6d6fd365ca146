//! Process execution utilities with timeout support
//!
//! Helpers for running yt-dlp with a wall-clock bound so a hung extractor
//! process cannot stall its job forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::error::AppError;

/// Run an async Command with a timeout.
///
/// Returns the process Output on success, or an AppError on timeout/IO failure.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, AppError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(AppError::Io(e)),
        Err(_) => Err(AppError::Download(format!(
            "process timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_with_timeout_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let result = run_with_timeout(&mut cmd, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(AppError::Download(_))));
    }

    #[tokio::test]
    async fn test_run_with_timeout_success() {
        let mut cmd = Command::new("true");
        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).await.unwrap();
        assert!(output.status.success());
    }
}
