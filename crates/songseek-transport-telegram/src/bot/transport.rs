use crate::bot::resilient::{edit_message_resilient, send_audio_resilient, send_message_resilient};
use crate::bot::views::{audio_file_name, page_keyboard};
use anyhow::Result;
use async_trait::async_trait;
use songseek_core::search::PageView;
use songseek_core::transport::ChatTransport;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use tracing::debug;

/// Telegram-specific chat transport.
///
/// Bound to a chat and, for callback queries, to the message carrying the
/// pressed button so pages can be edited in place.
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
    origin: Option<MessageId>,
}

impl TelegramTransport {
    /// Create a transport for a chat.
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            origin: None,
        }
    }

    /// Create a transport bound to the message a callback came from.
    pub const fn for_message(bot: Bot, chat_id: ChatId, origin: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            origin: Some(origin),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, text: &str) -> Result<()> {
        send_message_resilient(&self.bot, self.chat_id, text, None).await?;
        Ok(())
    }

    async fn send_page(&self, view: &PageView) -> Result<()> {
        send_message_resilient(
            &self.bot,
            self.chat_id,
            view.text.as_str(),
            Some(page_keyboard(view)),
        )
        .await?;
        Ok(())
    }

    async fn edit_page(&self, view: &PageView) -> Result<()> {
        let Some(msg_id) = self.origin else {
            // Nothing to edit; fall back to a fresh message
            debug!(chat_id = self.chat_id.0, "No origin message; sending page instead");
            return self.send_page(view).await;
        };
        edit_message_resilient(
            &self.bot,
            self.chat_id,
            msg_id,
            view.text.as_str(),
            page_keyboard(view),
        )
        .await?;
        Ok(())
    }

    async fn send_audio(&self, path: &Path, caption: &str) -> Result<()> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        let file_name = audio_file_name(caption, extension);
        send_audio_resilient(&self.bot, self.chat_id, path, &file_name, caption).await?;
        Ok(())
    }
}
