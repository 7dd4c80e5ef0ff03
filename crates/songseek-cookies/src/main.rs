//! Refresh the cookie jar used by the extractor.
//!
//! Drives a browser through a WebDriver server (e.g. `chromedriver`).

mod refresh;
mod webdriver;

use clap::Parser;
use refresh::{refresh, RefreshOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Refresh the platform cookie jar through a WebDriver browser session
#[derive(Parser, Debug)]
#[command(name = "songseek-cookies", version, about)]
struct Cli {
    /// WebDriver server URL
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Sign-in page opened on the first (interactive) run
    #[arg(
        long,
        default_value = "https://accounts.google.com/ServiceLogin?service=youtube"
    )]
    login_url: String,

    /// Site whose cookies are collected
    #[arg(long, default_value = "https://www.youtube.com")]
    target_url: String,

    /// Netscape cookie jar to write
    #[arg(short, long, default_value = "cookies.txt")]
    output: PathBuf,

    /// Raw cookie state kept between runs
    #[arg(long, default_value = "cookies.json")]
    state: PathBuf,

    /// Never open a visible browser
    #[arg(long)]
    headless: bool,

    /// Seconds to wait after each page load
    #[arg(long, default_value_t = 5)]
    settle_secs: u64,
}

impl From<Cli> for RefreshOptions {
    fn from(cli: Cli) -> Self {
        Self {
            webdriver_url: cli.webdriver_url,
            login_url: cli.login_url,
            target_url: cli.target_url,
            output: cli.output,
            state: cli.state,
            headless: cli.headless,
            settle: Duration::from_secs(cli.settle_secs),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("songseek_cookies=info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let options = RefreshOptions::from(Cli::parse());

    match refresh(&options).await {
        Ok(count) => {
            println!("✅ Saved {count} cookies to {}", options.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Cookie refresh failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
