//! Cookie refresh procedure.
//!
//! The first run opens a visible browser on the login page and waits for
//! the operator to sign in. Later runs are headless: the saved cookies are
//! injected into a fresh session, the target is reloaded, and the refreshed
//! cookies are written back.

use crate::webdriver::{BrowserOptions, BrowserSession, WebDriverClient, WebDriverCookie};
use anyhow::{Context, Result};
use songseek_core::cookies::CookieJar;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Inputs of one refresh run
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// WebDriver server URL
    pub webdriver_url: String,
    /// Page used for the interactive sign-in
    pub login_url: String,
    /// Site whose cookies are collected
    pub target_url: String,
    /// Netscape jar consumed by the extractor
    pub output: PathBuf,
    /// Raw cookies kept between runs
    pub state: PathBuf,
    /// Never open a visible browser; requires saved state
    pub headless: bool,
    /// Pause after each navigation
    pub settle: Duration,
}

/// How a run obtains its cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Visible browser, operator signs in
    Interactive,
    /// Headless browser seeded from saved state
    Headless,
}

impl RefreshOptions {
    /// Interactive when no saved state exists and headless was not forced.
    #[must_use]
    pub fn mode(&self) -> RefreshMode {
        if self.headless || self.state.exists() {
            RefreshMode::Headless
        } else {
            RefreshMode::Interactive
        }
    }

    /// Domain used for cookies the driver reports without one.
    fn default_domain(&self) -> String {
        self.target_url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split(['/', ':']).next())
            .filter(|host| !host.is_empty())
            .unwrap_or("localhost")
            .to_string()
    }
}

/// Load cookies saved by a previous run.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<Vec<WebDriverCookie>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Persist raw cookies for the next run.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_state(path: &Path, cookies: &[WebDriverCookie]) -> Result<()> {
    let text = serde_json::to_string_pretty(cookies)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the Netscape jar; returns the number of cookies written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_jar(path: &Path, cookies: &[WebDriverCookie], default_domain: &str) -> Result<usize> {
    let jar = CookieJar::new(
        cookies
            .iter()
            .map(|cookie| cookie.to_netscape(default_domain))
            .collect(),
    );
    std::fs::write(path, jar.to_netscape_string())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(jar.cookies.len())
}

/// Run one refresh; the browser session is always closed.
///
/// # Errors
///
/// Returns an error if the driver fails or output files cannot be written.
pub async fn refresh(options: &RefreshOptions) -> Result<usize> {
    let mode = options.mode();
    info!(mode = ?mode, driver = %options.webdriver_url, "Refreshing cookies");

    let saved = match mode {
        RefreshMode::Headless => load_state(&options.state)
            .context("headless refresh needs the state of a previous interactive run")?,
        RefreshMode::Interactive => Vec::new(),
    };

    let driver = WebDriverClient::new(&options.webdriver_url, Duration::from_secs(60));
    let session = driver
        .new_session(BrowserOptions {
            headless: mode == RefreshMode::Headless,
        })
        .await
        .context("failed to start browser session")?;

    let collected = collect(&session, options, mode, &saved).await;

    if let Err(e) = session.delete().await {
        warn!(error = %e, "Failed to close browser session");
    }

    let cookies = collected?;
    save_state(&options.state, &cookies)?;
    let written = write_jar(&options.output, &cookies, &options.default_domain())?;
    info!(cookies = written, output = %options.output.display(), "Cookies saved");
    Ok(written)
}

async fn collect(
    session: &BrowserSession<'_>,
    options: &RefreshOptions,
    mode: RefreshMode,
    saved: &[WebDriverCookie],
) -> Result<Vec<WebDriverCookie>> {
    match mode {
        RefreshMode::Interactive => {
            session.navigate(&options.login_url).await?;
            wait_for_operator().await?;
        }
        RefreshMode::Headless => {
            // Cookies can only be set for the domain currently loaded
            session.navigate(&options.target_url).await?;
            tokio::time::sleep(options.settle).await;
            inject(session, saved).await;
        }
    }
    session.navigate(&options.target_url).await?;
    tokio::time::sleep(options.settle).await;
    Ok(session.cookies().await?)
}

async fn inject(session: &BrowserSession<'_>, saved: &[WebDriverCookie]) {
    let mut injected = 0usize;
    for cookie in saved {
        match session.add_cookie(cookie).await {
            Ok(()) => injected += 1,
            Err(e) => warn!(name = %cookie.name, error = %e, "Cookie rejected by browser"),
        }
    }
    info!(injected, total = saved.len(), "Saved cookies injected");
}

async fn wait_for_operator() -> Result<()> {
    println!("⚠️ No saved cookies found. Sign in in the opened browser, then press Enter.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read from stdin")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> RefreshOptions {
        RefreshOptions {
            webdriver_url: "http://localhost:9515".to_string(),
            login_url: "https://accounts.google.com/ServiceLogin?service=youtube".to_string(),
            target_url: "https://www.youtube.com".to_string(),
            output: dir.join("cookies.txt"),
            state: dir.join("cookies.json"),
            headless: false,
            settle: Duration::ZERO,
        }
    }

    fn cookie(name: &str) -> WebDriverCookie {
        WebDriverCookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: Some(".youtube.com".to_string()),
            path: Some("/".to_string()),
            secure: Some(true),
            http_only: Some(true),
            expiry: Some(1_900_000_000),
        }
    }

    #[test]
    fn test_mode_selection() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut opts = options(dir.path());
        assert_eq!(opts.mode(), RefreshMode::Interactive);

        opts.headless = true;
        assert_eq!(opts.mode(), RefreshMode::Headless);

        opts.headless = false;
        save_state(&opts.state, &[cookie("SID")])?;
        assert_eq!(opts.mode(), RefreshMode::Headless);
        Ok(())
    }

    #[test]
    fn test_state_roundtrip_and_jar_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let opts = options(dir.path());
        let cookies = vec![cookie("SID"), cookie("HSID")];

        save_state(&opts.state, &cookies)?;
        assert_eq!(load_state(&opts.state)?, cookies);

        let written = write_jar(&opts.output, &cookies, &opts.default_domain())?;
        assert_eq!(written, 2);
        assert_eq!(CookieJar::validate_file(&opts.output)?, 2);
        Ok(())
    }

    #[test]
    fn test_default_domain() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut opts = options(dir.path());
        assert_eq!(opts.default_domain(), "www.youtube.com");

        opts.target_url = "http://127.0.0.1:8080/path".to_string();
        assert_eq!(opts.default_domain(), "127.0.0.1");

        opts.target_url = "not a url".to_string();
        assert_eq!(opts.default_domain(), "localhost");
        Ok(())
    }

    #[tokio::test]
    async fn test_headless_without_state_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut opts = options(dir.path());
        opts.headless = true;

        let err = refresh(&opts).await.err().map(|e| format!("{e:#}"));
        assert!(err.is_some_and(|e| e.contains("previous interactive run")));
        assert!(!opts.output.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_driver_leaves_files_untouched() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut opts = options(dir.path());
        opts.webdriver_url = "http://127.0.0.1:9".to_string();
        save_state(&opts.state, &[cookie("SID")])?;
        let before = std::fs::read_to_string(&opts.state)?;

        assert!(refresh(&opts).await.is_err());
        assert!(!opts.output.exists());
        assert_eq!(std::fs::read_to_string(&opts.state)?, before);
        Ok(())
    }
}
