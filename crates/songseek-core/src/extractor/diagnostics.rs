//! Diagnose `yt-dlp` failures from their stderr output.

// lazy_regex! validates patterns at compile time
#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Class of an extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource cannot be fetched (private, removed, blocked...)
    Fatal,
    /// Likely to succeed later (network, rate limiting)
    Transient,
    /// Anything else
    Other,
}

/// Patterns indicating the resource itself is unavailable
const FATAL_ERROR_PATTERNS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video is not available",
    "Sign in to confirm your age",
    "age-restricted",
    "members-only",
    "This video is private",
    "removed by the uploader",
    "no longer available",
    "blocked it in your country",
    "geo-restricted",
    "copyright claim",
    "This video has been removed",
    "Unsupported URL",
    "Premieres in",
    "This live event will begin",
    "Join this channel to get access",
    "HTTP Error 403",
    "HTTP Error 404",
];

/// Patterns indicating transient errors
const TRANSIENT_ERROR_PATTERNS: &[&str] = &[
    "Connection reset",
    "Connection timed out",
    "Unable to download webpage",
    "HTTP Error 429",
    "HTTP Error 503",
    "Read timed out",
    "network is unreachable",
    "Temporary failure in name resolution",
];

/// `ERROR:` lines printed by yt-dlp
static RE_ERROR_LINE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?m)^ERROR:\s*(.+)$");

/// Classify an error message.
#[must_use]
pub fn diagnose(message: &str) -> ErrorKind {
    if FATAL_ERROR_PATTERNS.iter().any(|p| message.contains(p)) {
        ErrorKind::Fatal
    } else if TRANSIENT_ERROR_PATTERNS.iter().any(|p| message.contains(p)) {
        ErrorKind::Transient
    } else {
        ErrorKind::Other
    }
}

/// Extract the most relevant part of stderr: the `ERROR:` lines when
/// present, otherwise the last non-empty line.
#[must_use]
pub fn error_excerpt(stderr: &str) -> String {
    let errors: Vec<&str> = RE_ERROR_LINE
        .captures_iter(stderr)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .collect();

    if errors.is_empty() {
        stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string()
    } else {
        errors.join("; ")
    }
}
