use crate::bot;
use crate::bot::handlers::Command;
use crate::config::BotSettings;
use songseek_core::extractor::YtDlpExtractor;
use songseek_core::flow::SearchFlow;
use songseek_core::session::InMemorySessionStore;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let flow = init_flow(&settings);

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    prepare_bot(&bot).await;
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![flow, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_flow(settings: &BotSettings) -> Arc<SearchFlow> {
    let flow_settings = settings.flow.as_ref();

    info!(
        "Initializing session store (ttl: {}s, max_sessions: {})",
        flow_settings.session_ttl_secs, flow_settings.session_max_sessions
    );
    let sessions = Arc::new(InMemorySessionStore::new(
        flow_settings.session_ttl_secs,
        flow_settings.session_max_sessions,
    ));

    info!(
        ytdlp = %flow_settings.ytdlp_path,
        download_dir = %flow_settings.download_dir().display(),
        "Extractor initialized."
    );
    let extractor = Arc::new(YtDlpExtractor::new(flow_settings.clone()));

    Arc::new(SearchFlow::new(extractor, sessions, flow_settings))
}

/// Drop pending updates from a previous run and publish the command list.
async fn prepare_bot(bot: &Bot) {
    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!("Failed to delete webhook: {}", e);
    }
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    flow: Arc<SearchFlow>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => bot::handlers::start(bot, msg).await,
        Command::Help => bot::handlers::help(bot, msg).await,
        Command::Search => bot::handlers::search(bot, msg, flow).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    flow: Arc<SearchFlow>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_text(bot, msg, flow).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    flow: Arc<SearchFlow>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_callback(bot, q, flow).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
