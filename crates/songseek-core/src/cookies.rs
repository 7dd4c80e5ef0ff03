//! Netscape cookie jar format.
//!
//! Produced by the cookie-refresh utility and consumed by `yt-dlp`
//! through `--cookies`. One cookie per line, seven tab-separated fields:
//! domain, include-subdomains flag, path, secure flag, expiry (unix
//! seconds, `0` for session cookies), name, value.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

/// Header line expected by `yt-dlp` and curl
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Errors produced while reading a cookie jar
#[derive(Error, Debug)]
pub enum CookieError {
    /// A line did not have seven tab-separated fields
    #[error("malformed cookie on line {line}")]
    Malformed {
        /// 1-based line number
        line: usize,
    },
    /// The jar contains no cookies
    #[error("cookie jar contains no cookies")]
    Empty,
    /// The jar could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One cookie in Netscape format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetscapeCookie {
    /// Cookie domain
    pub domain: String,
    /// Whether subdomains receive the cookie
    pub include_subdomains: bool,
    /// Cookie path
    pub path: String,
    /// Sent over HTTPS only
    pub secure: bool,
    /// Expiry as unix seconds; 0 for session cookies
    pub expires: u64,
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
}

impl NetscapeCookie {
    /// Build a cookie; subdomain inclusion follows a leading `.` on the domain.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        secure: bool,
        expires: Option<u64>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let domain = domain.into();
        Self {
            include_subdomains: domain.starts_with('.'),
            domain,
            path: path.into(),
            secure,
            expires: expires.unwrap_or(0),
            name: name.into(),
            value: value.into(),
        }
    }

    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.domain,
            flag(self.include_subdomains),
            self.path,
            flag(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }

    fn parse_line(line: &str, number: usize) -> Result<Self, CookieError> {
        let malformed = || CookieError::Malformed { line: number };
        let fields: Vec<&str> = line.split('\t').collect();
        let [domain, subdomains, path, secure, expires, name, value] = fields.as_slice() else {
            return Err(malformed());
        };
        Ok(Self {
            domain: (*domain).to_string(),
            include_subdomains: subdomains.eq_ignore_ascii_case("TRUE"),
            path: (*path).to_string(),
            secure: secure.eq_ignore_ascii_case("TRUE"),
            expires: expires.parse().map_err(|_| malformed())?,
            name: (*name).to_string(),
            value: (*value).to_string(),
        })
    }
}

const fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// An ordered collection of cookies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    /// Cookies in file order
    pub cookies: Vec<NetscapeCookie>,
}

impl CookieJar {
    /// Wrap a list of cookies.
    #[must_use]
    pub const fn new(cookies: Vec<NetscapeCookie>) -> Self {
        Self { cookies }
    }

    /// Serialize with the Netscape header.
    #[must_use]
    pub fn to_netscape_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{NETSCAPE_HEADER}");
        for cookie in &self.cookies {
            let _ = writeln!(out, "{}", cookie.to_line());
        }
        out
    }

    /// Parse a jar; blank lines and comments are skipped, `#HttpOnly_` lines are kept.
    ///
    /// # Errors
    ///
    /// Returns `CookieError::Malformed` for a line without seven fields.
    pub fn parse(text: &str) -> Result<Self, CookieError> {
        let mut cookies = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
                Some(rest) => rest,
                None if line.starts_with('#') => continue,
                None => line,
            };
            cookies.push(NetscapeCookie::parse_line(line, idx + 1)?);
        }
        Ok(Self { cookies })
    }

    /// Check that `path` holds a non-empty, well-formed jar.
    ///
    /// Returns the number of cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or empty.
    pub fn validate_file(path: &Path) -> Result<usize, CookieError> {
        let text = std::fs::read_to_string(path)?;
        let jar = Self::parse(&text)?;
        if jar.cookies.is_empty() {
            return Err(CookieError::Empty);
        }
        Ok(jar.cookies.len())
    }
}
