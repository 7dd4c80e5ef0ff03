//! Outbound chat surface used by the workflow.
//!
//! A transport is bound to one conversation (and, for callbacks, to the
//! message that carried the pressed button).

use crate::search::PageView;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Messaging operations the workflow needs from a chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, text: &str) -> Result<()>;

    /// Send a result page as a new message.
    async fn send_page(&self, view: &PageView) -> Result<()>;

    /// Replace the page on the originating message in place.
    async fn edit_page(&self, view: &PageView) -> Result<()>;

    /// Deliver a local audio file with a caption.
    async fn send_audio(&self, path: &Path, caption: &str) -> Result<()>;
}
