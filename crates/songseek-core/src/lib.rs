#![deny(missing_docs)]
//! SongSeek core library.
//!
//! Transport-agnostic logic for the song search bot: query classification,
//! result filtering, pagination, selection tokens, per-conversation sessions,
//! the selection workflow and the `yt-dlp` extraction backend.

/// Configuration management and workflow constants.
pub mod config;
/// Netscape cookie jar format.
pub mod cookies;
/// Extraction collaborator (search and audio download).
pub mod extractor;
/// Search/select/download workflow.
pub mod flow;
/// Query classification, result sets, pagination and selection tokens.
pub mod search;
/// Per-conversation session storage.
pub mod session;
/// Outbound chat surface used by the workflow.
pub mod transport;
/// Utility functions.
pub mod utils;

/// Test fixtures and mock helpers.
#[cfg(test)]
pub mod testing;
