use crate::bot::resilient::send_message_resilient;
use crate::bot::views::{SEARCH_HINT_TEXT, WELCOME_TEXT};
use crate::bot::TelegramTransport;
use anyhow::Result;
use songseek_core::flow::{FlowOutcome, SearchFlow};
use std::sync::Arc;
use teloxide::{prelude::*, types::CallbackQuery, utils::command::BotCommands};
use tracing::{debug, info, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    /// Start the bot and show welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Show the command list
    #[command(description = "Show available commands.")]
    Help,
    /// Search for a song or an artist
    #[command(description = "Search for a song or an artist.")]
    Search,
}

/// Handle `/start`: greet the user.
///
/// # Errors
///
/// Returns an error if the greeting cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!(chat_id = msg.chat.id.0, "Start command");
    send_message_resilient(&bot, msg.chat.id, WELCOME_TEXT, None).await?;
    Ok(())
}

/// Handle `/help`.
///
/// # Errors
///
/// Returns an error if the message cannot be sent.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    send_message_resilient(&bot, msg.chat.id, Command::descriptions().to_string(), None).await?;
    Ok(())
}

/// Handle `/search`: wait for a query.
///
/// # Errors
///
/// Returns an error if the prompt cannot be sent.
pub async fn search(bot: Bot, msg: Message, flow: Arc<SearchFlow>) -> Result<()> {
    let transport = TelegramTransport::new(bot, msg.chat.id);
    flow.begin_search(msg.chat.id.0, &transport).await?;
    Ok(())
}

/// Handle a plain text message.
///
/// # Errors
///
/// Returns an error if Telegram API calls fail.
pub async fn handle_text(bot: Bot, msg: Message, flow: Arc<SearchFlow>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let transport = TelegramTransport::new(bot.clone(), msg.chat.id);
    let outcome = flow.handle_query(msg.chat.id.0, text, &transport).await?;
    debug!(chat_id = msg.chat.id.0, outcome = ?outcome, "Text handled");

    if outcome == FlowOutcome::Ignored {
        send_message_resilient(&bot, msg.chat.id, SEARCH_HINT_TEXT, None).await?;
    }
    Ok(())
}

/// Handle a result-page button press.
///
/// The query is answered first so the client stops its spinner while a
/// download runs.
///
/// # Errors
///
/// Returns an error if Telegram API calls fail.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, flow: Arc<SearchFlow>) -> Result<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        warn!("Callback message missing; ignoring");
        return Ok(());
    };

    let chat_id = message.chat().id;
    let transport = TelegramTransport::for_message(bot, chat_id, message.id());
    let outcome = flow.handle_callback(chat_id.0, data, &transport).await?;
    debug!(chat_id = chat_id.0, outcome = ?outcome, "Callback handled");
    Ok(())
}
