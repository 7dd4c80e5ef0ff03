use dotenvy::dotenv;
use regex::Regex;
use songseek_core::config::FlowSettings;
use songseek_transport_telegram::config::{BotSettings, TelegramSettings};
use songseek_transport_telegram::runner::run_bot;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Masks bot tokens before log lines reach the terminal
struct TokenRedactor {
    token: Regex,
    env_assignment: Regex,
}

impl TokenRedactor {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Matches bare tokens as well as `/bot<token>/` in API URLs
            token: Regex::new(r"[0-9]{8,10}:[A-Za-z0-9_-]{30,}")?,
            env_assignment: Regex::new(r"((?:TELEGRAM|BOT)_TOKEN=)[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self.token.replace_all(input, "[TELEGRAM_TOKEN]");
        self.env_assignment
            .replace_all(&output, "$1[MASKED]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Arc<TokenRedactor>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let redacted = self.redactor.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(redacted.as_bytes())?;
        // Callers expect the input length back
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Compile before logging starts so nothing is written unredacted
    let redactor = Arc::new(TokenRedactor::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?);

    init_logging(redactor);

    info!("Starting SongSeek TG Bot...");

    let settings = init_settings();

    run_bot(settings).await;

    Ok(())
}

fn init_logging(redactor: Arc<TokenRedactor>) {
    let make_writer = move || RedactingWriter {
        inner: io::stderr(),
        redactor: redactor.clone(),
    };

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "songseek_core=info,songseek_transport_telegram=info,teloxide=warn,hyper=warn,reqwest=warn",
            )
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<BotSettings> {
    let flow_settings = match FlowSettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load search configuration: {}", e);
            std::process::exit(1);
        }
    };
    let telegram_settings = match TelegramSettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load telegram configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully.");
    Arc::new(BotSettings::new(flow_settings, telegram_settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw1";

    #[test]
    fn test_redacts_token_in_api_url() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = format!("error sending request for url (https://api.telegram.org/bot{TOKEN}/getUpdates)");
        let redacted = redactor.redact(&line);
        assert!(!redacted.contains(TOKEN));
        assert!(redacted.contains("/bot[TELEGRAM_TOKEN]/getUpdates"));
        Ok(())
    }

    #[test]
    fn test_redacts_bare_token_and_env_assignment() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        assert_eq!(redactor.redact(TOKEN), "[TELEGRAM_TOKEN]");
        assert_eq!(redactor.redact("BOT_TOKEN=secret-value"), "BOT_TOKEN=[MASKED]");
        assert_eq!(redactor.redact("chat_id=123456789 page=2"), "chat_id=123456789 page=2");
        Ok(())
    }

    #[test]
    fn test_writer_reports_input_length() -> io::Result<()> {
        let redactor = Arc::new(TokenRedactor::new().map_err(io::Error::other)?);
        let mut sink = Vec::new();
        {
            let mut writer = RedactingWriter {
                inner: &mut sink,
                redactor,
            };
            let written = writer.write(TOKEN.as_bytes())?;
            assert_eq!(written, TOKEN.len());
        }
        assert_eq!(String::from_utf8_lossy(&sink), "[TELEGRAM_TOKEN]");
        Ok(())
    }
}
