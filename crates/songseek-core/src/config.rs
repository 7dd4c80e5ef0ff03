//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the workflow constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of results shown on one page of the keyboard
pub const PAGE_SIZE: usize = 5;
/// Maximum number of results kept after filtering
pub const MAX_RESULTS: usize = 20;
/// Maximum characters of a title shown on a result button
pub const BUTTON_TITLE_MAX_CHARS: usize = 35;
/// Maximum characters of a title used as audio caption
pub const CAPTION_TITLE_MAX_CHARS: usize = 64;
/// Suffix appended to artist-style queries to bias results toward the catalog
pub const ARTIST_QUERY_SUFFIX: &str = "songs";
/// Words that mark a query as a search for a single track
pub const SONG_KEYWORDS: &[&str] = &["песня", "пісня", "song", "трек", "track"];
/// Queries with at least this many words are always track-style
pub const ARTIST_QUERY_MAX_WORDS: usize = 4;
/// Title fragments that exclude a result (compared case-insensitively)
pub const TITLE_DENYLIST: &[&str] = &["live", "cover", "interview", "reaction", "album", "lyrics"];
/// Telegram limit for inline button callback data, in bytes
pub const CALLBACK_DATA_MAX_BYTES: usize = 64;

/// Telegram API retry: maximum attempts
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Telegram API retry: initial backoff in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Telegram API retry: maximum backoff in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

/// Settings of the search/download workflow and its extraction backend
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlowSettings {
    /// Path or name of the `yt-dlp` executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Path or name of the `ffmpeg` executable used for transcoding
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Netscape cookie jar passed to `yt-dlp`
    #[serde(default = "default_cookies_file")]
    pub cookies_file: PathBuf,
    /// Directory for downloaded audio (defaults to the OS temp dir)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Number of ranked matches requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Target audio codec
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Target audio bitrate
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    /// Idle lifetime of a session in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Maximum number of sessions kept in memory
    #[serde(default = "default_session_max_sessions")]
    pub session_max_sessions: u64,
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_cookies_file() -> PathBuf {
    PathBuf::from("cookies.txt")
}

const fn default_search_limit() -> usize {
    MAX_RESULTS
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

const fn default_session_ttl_secs() -> u64 {
    86_400
}

const fn default_session_max_sessions() -> u64 {
    10_000
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
            cookies_file: default_cookies_file(),
            download_dir: None,
            search_limit: default_search_limit(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            session_ttl_secs: default_session_ttl_secs(),
            session_max_sessions: default_session_max_sessions(),
        }
    }
}

impl FlowSettings {
    /// Load settings from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Directory where downloads are written.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Search limit clamped to `1..=MAX_RESULTS`.
    #[must_use]
    pub fn effective_search_limit(&self) -> usize {
        self.search_limit.clamp(1, MAX_RESULTS)
    }
}

/// Build the layered configuration shared by all settings structs.
///
/// Sources, later ones overriding earlier ones: `config/default`,
/// `config/{RUN_MODE}`, `config/local`, `APP__`-prefixed environment
/// variables, then plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}
