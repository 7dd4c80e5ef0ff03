//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Wrappers around Telegram API operations that retry on transient network
//! failures using exponential backoff with jitter.
//!
//! # Usage
//!
//! ```ignore
//! use songseek_transport_telegram::bot::resilient::{send_message_resilient, edit_message_resilient};
//!
//! let msg = send_message_resilient(&bot, chat_id, "🔍 Searching...", None).await?;
//! edit_message_resilient(&bot, chat_id, msg.id, "Search results (page 2 of 2):", keyboard).await?;
//! ```

use anyhow::Result;
use songseek_core::utils::retry_transport_operation;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, InputFile, Message, MessageId};
use tracing::debug;

const ERROR_NOT_MODIFIED: &str = "message is not modified";

/// Send a message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = text.into();
    retry_transport_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(markup) = keyboard.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit a message's text and inline keyboard with automatic retry.
///
/// Returns `Ok(None)` when Telegram reports the message is not modified.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
) -> Result<Option<Message>> {
    let text = text.into();
    retry_transport_operation(|| async {
        match bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(msg) => Ok(Some(msg)),
            Err(e) => {
                if e.to_string().contains(ERROR_NOT_MODIFIED) {
                    debug!("Message update skipped: message is not modified");
                    return Ok(None);
                }
                Err(anyhow::anyhow!("Telegram edit error: {e}"))
            }
        }
    })
    .await
}

/// Upload a local audio file with caption and title metadata, retrying on failure.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_audio_resilient(
    bot: &Bot,
    chat_id: ChatId,
    path: &Path,
    file_name: &str,
    title: &str,
) -> Result<Message> {
    retry_transport_operation(|| async {
        let file = InputFile::file(path).file_name(file_name.to_string());
        bot.send_audio(chat_id, file)
            .caption(title.to_string())
            .title(title.to_string())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}
