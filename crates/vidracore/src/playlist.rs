//! Playlist extraction for batch downloads.
//!
//! Uses yt-dlp's flat extraction to list playlist members without probing
//! each one. Entries that carry no identifier are skipped silently; they
//! never occupy a job slot.

use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use crate::config;
use crate::error::{AppError, AppResult};
use crate::process::run_with_timeout;
use crate::resolve::PlayableItem;

/// Playlist metadata with its ordered members
#[derive(Debug, Clone)]
pub struct PlaylistInfo {
    /// Playlist title
    pub title: String,
    /// Ordered playable entries (null-id members already dropped)
    pub entries: Vec<PlayableItem>,
}

/// JSON structure from yt-dlp --flat-playlist --dump-single-json
#[derive(Debug, Deserialize)]
struct FlatPlaylistJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    entries: Vec<Option<FlatEntryJson>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntryJson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Checks if a URL is a playlist URL
pub fn is_playlist_url(url: &Url) -> bool {
    if url.query_pairs().any(|(key, _)| key == "list") {
        return true;
    }
    url.path().to_lowercase().contains("/playlist")
}

/// Extracts playlist entries from a URL using yt-dlp flat extraction
pub async fn extract_playlist(url: &Url) -> AppResult<PlaylistInfo> {
    let ytdl_bin = &*config::YTDL_BIN;
    let socket_timeout = config::download::SOCKET_TIMEOUT_SECS.to_string();

    let args: Vec<&str> = vec![
        "--flat-playlist",
        "--dump-single-json",
        "--ignore-errors",
        "--quiet",
        "--no-warnings",
        "--socket-timeout",
        &socket_timeout,
        url.as_str(),
    ];

    log::info!("Extracting playlist from: {}", url);

    let mut cmd = Command::new(ytdl_bin);
    cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = run_with_timeout(&mut cmd, config::probe::timeout()).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("yt-dlp playlist extraction failed for {}: {}", url, stderr);
        return Err(AppError::Extraction(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_flat_playlist(stdout.trim())
}

/// Parse the flat-extraction JSON into playlist info.
fn parse_flat_playlist(json: &str) -> AppResult<PlaylistInfo> {
    if json.is_empty() {
        return Err(AppError::NotFound);
    }

    let parsed: FlatPlaylistJson = serde_json::from_str(json)?;
    let playlist_uploader = parsed.uploader;

    let mut entries: Vec<PlayableItem> = Vec::new();
    for entry in parsed.entries.into_iter().flatten() {
        // A member with no identifier is unplayable filler (deleted or
        // private video) — skip without reserving a slot.
        let Some(id) = entry.id else { continue };

        let entry_url = entry
            .url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));
        let position = entries.len() + 1;

        entries.push(PlayableItem {
            id,
            url: entry_url,
            title: entry.title.unwrap_or_else(|| format!("Video {}", position)),
            uploader: entry
                .uploader
                .or_else(|| playlist_uploader.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            duration_secs: entry.duration.map(|d| d as u64).unwrap_or(0),
            thumbnail_url: None,
        });
    }

    if entries.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(PlaylistInfo {
        title: parsed.title.unwrap_or_else(|| "Playlist".to_string()),
        entries,
    })
}

/// Format duration as mm:ss or hh:mm:ss
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_playlist_url_list_param() {
        let url = Url::parse("https://www.youtube.com/watch?v=abc&list=PLdef").unwrap();
        assert!(is_playlist_url(&url));
    }

    #[test]
    fn test_is_playlist_url_playlist_page() {
        let url = Url::parse("https://www.youtube.com/playlist?list=PLdef").unwrap();
        assert!(is_playlist_url(&url));
    }

    #[test]
    fn test_is_playlist_url_single_video() {
        let url = Url::parse("https://www.youtube.com/watch?v=abc").unwrap();
        assert!(!is_playlist_url(&url));
    }

    #[test]
    fn test_parse_flat_playlist_basic() {
        let json = r#"{
            "title": "My Mix",
            "uploader": "Some Channel",
            "entries": [
                {"id": "aaa", "url": "https://www.youtube.com/watch?v=aaa", "title": "First", "duration": 61.0},
                {"id": "bbb", "title": "Second"}
            ]
        }"#;
        let info = parse_flat_playlist(json).unwrap();
        assert_eq!(info.title, "My Mix");
        assert_eq!(info.entries.len(), 2);
        assert_eq!(info.entries[0].duration_secs, 61);
        assert_eq!(info.entries[1].url, "https://www.youtube.com/watch?v=bbb");
        assert_eq!(info.entries[1].uploader, "Some Channel");
    }

    #[test]
    fn test_parse_flat_playlist_skips_null_members() {
        let json = r#"{
            "title": "Gappy",
            "entries": [
                null,
                {"id": "aaa", "title": "Kept"},
                {"title": "No id, dropped"},
                {"id": "bbb", "title": "Also kept"}
            ]
        }"#;
        let info = parse_flat_playlist(json).unwrap();
        let ids: Vec<&str> = info.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_parse_flat_playlist_empty_is_not_found() {
        let json = r#"{"title": "Empty", "entries": []}"#;
        assert!(matches!(parse_flat_playlist(json), Err(AppError::NotFound)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3661), "1:01:01");
        assert_eq!(format_duration(30), "0:30");
    }
}
