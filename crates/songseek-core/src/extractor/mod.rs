//! Extraction collaborator: platform search and audio download.

/// Classification of extractor failures.
pub mod diagnostics;
/// `yt-dlp` backed extractor.
pub mod ytdlp;

pub use diagnostics::ErrorKind;
pub use ytdlp::YtDlpExtractor;

use crate::search::TrackInfo;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The extractor process could not be started
    #[error("failed to start extractor: {0}")]
    Spawn(#[source] std::io::Error),
    /// The extractor exited unsuccessfully
    #[error("extractor failed ({kind:?}, status {status}): {message}")]
    Failed {
        /// Exit status description
        status: String,
        /// Relevant stderr excerpt
        message: String,
        /// Diagnosed error class
        kind: ErrorKind,
    },
    /// Output could not be interpreted
    #[error("unexpected extractor output: {0}")]
    Parse(String),
    /// The extractor reported success but produced no file
    #[error("extractor produced no output file")]
    MissingOutput,
    /// The blocking worker panicked or was cancelled
    #[error("extractor worker failed: {0}")]
    Join(String),
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Diagnosed class; only process failures carry one.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Failed { kind, .. } => *kind,
            _ => ErrorKind::Other,
        }
    }
}

/// A downloaded audio file that is removed when no longer needed.
///
/// Call [`DownloadedAudio::remove`] after delivery; dropping the value
/// deletes a file that is still present.
#[derive(Debug)]
pub struct DownloadedAudio {
    path: PathBuf,
    title: String,
    removed: bool,
}

impl DownloadedAudio {
    /// Wrap a file produced by a download.
    #[must_use]
    pub const fn new(path: PathBuf, title: String) -> Self {
        Self {
            path,
            title,
            removed: false,
        }
    }

    /// Local file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Title reported by the platform.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Delete the file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be removed.
    pub async fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed downloaded file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for DownloadedAudio {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed downloaded file on drop"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove downloaded file"),
        }
    }
}

/// Interface for extraction backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Search the platform and return up to `limit` ranked candidates.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackInfo>, ExtractError>;

    /// Download and transcode the audio of a resource to a local file.
    async fn download(&self, id: &str) -> Result<DownloadedAudio, ExtractError>;
}
