//! `yt-dlp` extractor
//!
//! Runs the `yt-dlp` executable for searches and audio downloads. The
//! process calls are blocking and run on tokio's blocking pool so a slow
//! extraction never stalls the dispatcher.

use super::diagnostics::{diagnose, error_excerpt};
use super::{DownloadedAudio, ExtractError, Extractor};
use crate::config::FlowSettings;
use crate::cookies::CookieJar;
use crate::search::TrackInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Extractor backed by the `yt-dlp` command line tool
pub struct YtDlpExtractor {
    settings: FlowSettings,
    cookie_warning_logged: AtomicBool,
}

/// Subset of a `yt-dlp -j --flat-playlist` entry
#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
}

impl RawEntry {
    fn into_track(self) -> Option<TrackInfo> {
        let id = self.id.filter(|id| !id.is_empty())?;
        Some(TrackInfo {
            id,
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown title".to_string()),
            duration: self
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|d| d.floor() as u64),
        })
    }
}

impl YtDlpExtractor {
    /// Create a new extractor.
    #[must_use]
    pub const fn new(settings: FlowSettings) -> Self {
        Self {
            settings,
            cookie_warning_logged: AtomicBool::new(false),
        }
    }

    /// Cookie file arguments, or none when the jar is missing or invalid.
    fn cookie_args(&self) -> Vec<String> {
        let path = &self.settings.cookies_file;
        match CookieJar::validate_file(path) {
            Ok(count) => {
                debug!(cookies = count, path = %path.display(), "Using cookie file");
                vec!["--cookies".to_string(), path.display().to_string()]
            }
            Err(e) => {
                if !self.cookie_warning_logged.swap(true, Ordering::Relaxed) {
                    warn!(path = %path.display(), error = %e, "Cookie file unusable; continuing without cookies");
                }
                Vec::new()
            }
        }
    }

    /// Arguments for a search request.
    fn search_args(&self, query: &str, limit: usize) -> Vec<String> {
        let mut args = vec![
            "-j".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            "--ignore-errors".to_string(),
        ];
        args.extend(self.cookie_args());
        args.push(format!("ytsearch{limit}:{query}"));
        args
    }

    /// Arguments for downloading `id` to `<dir>/<stem>.<ext>`.
    fn download_args(&self, id: &str, dir: &Path, stem: &str) -> Vec<String> {
        let template = dir.join(format!("{stem}.%(ext)s"));
        let mut args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.settings.audio_format.clone(),
            "--audio-quality".to_string(),
            self.settings.audio_quality.clone(),
            "--ffmpeg-location".to_string(),
            self.settings.ffmpeg_path.clone(),
            "-o".to_string(),
            template.display().to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:title".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ];
        args.extend(self.cookie_args());
        args.push(format!("{WATCH_URL}{id}"));
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<String, ExtractError> {
        let program = self.settings.ytdlp_path.clone();
        debug!(program = %program, args = ?args, "Executing yt-dlp");

        let output = tokio::task::spawn_blocking(move || Command::new(program).args(&args).output())
            .await
            .map_err(|e| ExtractError::Join(e.to_string()))?
            .map_err(ExtractError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            error_excerpt(&stdout)
        } else {
            error_excerpt(&stderr)
        };
        let kind = diagnose(&message);
        warn!(status = %output.status, kind = ?kind, error = %message, "yt-dlp failed");
        Err(ExtractError::Failed {
            status: output.status.to_string(),
            message,
            kind,
        })
    }
}

/// Parse NDJSON search output; unparsable lines and entries without an id are skipped.
fn parse_search_output(output: &str) -> Vec<TrackInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<RawEntry>(line) {
            Ok(entry) => entry.into_track(),
            Err(e) => {
                debug!(error = %e, "Skipping unparsable search line");
                None
            }
        })
        .collect()
}

/// Parse `--print after_move:title` / `after_move:filepath` output.
fn parse_download_output(output: &str) -> Result<(String, PathBuf), ExtractError> {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    match lines.as_slice() {
        [.., title, path] => Ok(((*title).to_string(), PathBuf::from(path))),
        _ => Err(ExtractError::Parse(format!(
            "expected title and file path, got {} line(s)",
            lines.len()
        ))),
    }
}

/// Remove files left behind by an interrupted download.
async fn remove_partials(dir: &Path, stem: &str) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().to_string_lossy().starts_with(stem) {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove partial download");
            } else {
                debug!(path = %entry.path().display(), "Removed partial download");
            }
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackInfo>, ExtractError> {
        let output = self.run(self.search_args(query, limit)).await?;
        let tracks = parse_search_output(&output);
        info!(query = %query, found = tracks.len(), "Search completed");
        Ok(tracks)
    }

    async fn download(&self, id: &str) -> Result<DownloadedAudio, ExtractError> {
        let dir = self.settings.download_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let stem = Uuid::new_v4().as_simple().to_string();

        let result = match self.run(self.download_args(id, &dir, &stem)).await {
            Ok(output) => parse_download_output(&output),
            Err(e) => Err(e),
        };

        let error = match result {
            Ok((title, path)) => {
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    info!(track_id = %id, path = %path.display(), "Download completed");
                    return Ok(DownloadedAudio::new(path, title));
                }
                ExtractError::MissingOutput
            }
            Err(e) => e,
        };

        remove_partials(&dir, &stem).await;
        Err(error)
    }
}
