//! Minimal W3C WebDriver client.
//!
//! Covers what cookie refresh needs: create a browser session, navigate,
//! read and add cookies, delete the session.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use songseek_core::cookies::NetscapeCookie;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors returned by the WebDriver client
#[derive(Error, Debug)]
pub enum WebDriverError {
    /// The driver could not be reached or the request failed in transit
    #[error("WebDriver request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The driver answered with a WebDriver error object
    #[error("WebDriver error `{error}`: {message}")]
    Protocol {
        /// Error code such as `invalid argument`
        error: String,
        /// Human-readable message
        message: String,
    },
    /// The response did not have the expected shape
    #[error("unexpected WebDriver response: {0}")]
    Response(String),
}

/// Cookie as exchanged over the WebDriver protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDriverCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cookie path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// HTTPS only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Hidden from scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Expiry as unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl WebDriverCookie {
    /// Convert to a Netscape jar entry; a missing domain falls back to `default_domain`.
    #[must_use]
    pub fn to_netscape(&self, default_domain: &str) -> NetscapeCookie {
        NetscapeCookie::new(
            self.domain.as_deref().unwrap_or(default_domain),
            self.path.as_deref().unwrap_or("/"),
            self.secure.unwrap_or(false),
            self.expiry,
            self.name.as_str(),
            self.value.as_str(),
        )
    }
}

/// Browser launch options
#[derive(Debug, Clone, Copy)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,
}

impl BrowserOptions {
    /// New-session payload for a Chrome driver.
    fn capabilities(self) -> Value {
        let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
        if self.headless {
            args.insert(0, "--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

/// Connection to a WebDriver server
pub struct WebDriverClient {
    base_url: String,
    client: reqwest::Client,
}

impl WebDriverClient {
    /// Create a client for the driver at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(_) => reqwest::Client::new(),
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, WebDriverError> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        Err(protocol_error(status, &value))
    }

    /// Start a browser session.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is unreachable or refuses the session.
    pub async fn new_session(&self, options: BrowserOptions) -> Result<BrowserSession<'_>, WebDriverError> {
        let value = self
            .send(
                self.client
                    .post(self.endpoint_url("session"))
                    .json(&options.capabilities()),
            )
            .await?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Response("missing sessionId".to_string()))?
            .to_string();
        debug!(session_id = %id, headless = options.headless, "WebDriver session created");
        Ok(BrowserSession { driver: self, id })
    }
}

fn protocol_error(status: reqwest::StatusCode, value: &Value) -> WebDriverError {
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    match (field("error"), field("message")) {
        (Some(error), message) => WebDriverError::Protocol {
            error,
            message: message.unwrap_or_default(),
        },
        (None, _) => WebDriverError::Response(format!("HTTP {status}: {value}")),
    }
}

/// An open browser session
pub struct BrowserSession<'a> {
    driver: &'a WebDriverClient,
    id: String,
}

impl BrowserSession<'_> {
    fn url(&self, path: &str) -> String {
        self.driver
            .endpoint_url(&format!("session/{}/{}", self.id, path))
    }

    /// Navigate to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails.
    pub async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        debug!(session_id = %self.id, url = %url, "Navigating");
        self.driver
            .send(self.driver.client.post(self.url("url")).json(&json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// All cookies visible to the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a cookie list.
    pub async fn cookies(&self) -> Result<Vec<WebDriverCookie>, WebDriverError> {
        let value = self
            .driver
            .send(self.driver.client.get(self.url("cookie")))
            .await?;
        serde_json::from_value(value).map_err(|e| WebDriverError::Response(e.to_string()))
    }

    /// Add a cookie to the current page's domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the cookie.
    pub async fn add_cookie(&self, cookie: &WebDriverCookie) -> Result<(), WebDriverError> {
        self.driver
            .send(
                self.driver
                    .client
                    .post(self.url("cookie"))
                    .json(&json!({ "cookie": cookie })),
            )
            .await?;
        Ok(())
    }

    /// Close the browser and end the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot be reached.
    pub async fn delete(self) -> Result<(), WebDriverError> {
        self.driver
            .send(
                self.driver
                    .client
                    .delete(self.driver.endpoint_url(&format!("session/{}", self.id))),
            )
            .await?;
        debug!(session_id = %self.id, "WebDriver session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_json_roundtrip_uses_camel_case() -> Result<(), serde_json::Error> {
        let cookie: WebDriverCookie = serde_json::from_str(
            r#"{"name":"SID","value":"abc","domain":".youtube.com","path":"/",
                "secure":true,"httpOnly":true,"expiry":1800000000,"sameSite":"Lax"}"#,
        )?;
        assert_eq!(cookie.http_only, Some(true));
        assert_eq!(cookie.expiry, Some(1_800_000_000));

        let value = serde_json::to_value(&cookie)?;
        assert_eq!(value["httpOnly"], json!(true));
        assert!(value.get("http_only").is_none());
        Ok(())
    }

    #[test]
    fn test_to_netscape() {
        let cookie = WebDriverCookie {
            name: "PREF".to_string(),
            value: "f6=40".to_string(),
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            expiry: None,
        };
        let netscape = cookie.to_netscape("www.youtube.com");
        assert_eq!(netscape.domain, "www.youtube.com");
        assert!(!netscape.include_subdomains);
        assert_eq!(netscape.path, "/");
        assert!(!netscape.secure);
        assert_eq!(netscape.expires, 0);

        let cookie = WebDriverCookie {
            domain: Some(".youtube.com".to_string()),
            secure: Some(true),
            expiry: Some(42),
            ..cookie
        };
        let netscape = cookie.to_netscape("www.youtube.com");
        assert!(netscape.include_subdomains);
        assert!(netscape.secure);
        assert_eq!(netscape.expires, 42);
    }

    #[test]
    fn test_capabilities_toggle_headless() {
        let headless = BrowserOptions { headless: true }.capabilities();
        let args = &headless["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert_eq!(args[0], json!("--headless=new"));

        let visible = BrowserOptions { headless: false }.capabilities();
        let args = visible["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert!(!args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--no-sandbox")));
    }

    #[test]
    fn test_protocol_error_parsing() {
        let err = protocol_error(
            reqwest::StatusCode::NOT_FOUND,
            &json!({"error": "invalid session id", "message": "session deleted"}),
        );
        assert!(matches!(
            err,
            WebDriverError::Protocol { ref error, ref message }
                if error == "invalid session id" && message == "session deleted"
        ));

        let err = protocol_error(reqwest::StatusCode::BAD_GATEWAY, &Value::Null);
        assert!(matches!(err, WebDriverError::Response(_)));
    }

    #[tokio::test]
    async fn test_unreachable_driver_is_http_error() {
        let client = WebDriverClient::new("http://127.0.0.1:9/", Duration::from_secs(2));
        let result = client.new_session(BrowserOptions { headless: true }).await;
        assert!(matches!(result, Err(WebDriverError::Http(_))));
    }
}
