/// Command, text and callback handlers
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// `ChatTransport` implementation over the Bot API
pub mod transport;
/// View layer for UI components (keyboards, messages)
pub mod views;

pub use transport::TelegramTransport;
