//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like user agent and headers
//! - GET requests to fetch page content
//! - Error classification
//!
//! Nothing is retried here; a failed page is counted and skipped by the
//! coordinator.

use crate::config::Config;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Connect timeout, independent of the configured request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Failure category of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// DNS failure, connection refused, TLS error
    Unreachable,
    Timeout,
    /// HTTP 4xx
    ClientError(u16),
    /// HTTP 5xx
    ServerError(u16),
    Other,
}

/// A failed fetch
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} fetching {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "unreachable"),
            Self::Timeout => write!(f, "timeout"),
            Self::ClientError(code) => write!(f, "HTTP {}", code),
            Self::ServerError(code) => write!(f, "HTTP {}", code),
            Self::Other => write!(f, "error"),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The request failed
    Failed(FetchError),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawl configuration; the user agent section and the
///   crawler timeout are used
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use shelf_sweep::config::Config;
/// use shelf_sweep::crawler::build_http_client;
///
/// let config = Config::for_site("https://shop.example.com/");
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    if let Ok(language) = HeaderValue::from_str(&config.user_agent.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.value.clone())
        .default_headers(headers)
        .timeout(config.crawler.request_timeout())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a single GET request
///
/// # Error Classification
///
/// | Condition | Kind |
/// |-----------|------|
/// | HTTP 4xx | ClientError |
/// | HTTP 5xx | ServerError |
/// | Timeout | Timeout |
/// | Connection refused, DNS, TLS | Unreachable |
/// | Anything else | Other |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchResult with the body or the classified failure
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return FetchResult::Failed(classify_request_error(url, &e)),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if status.is_client_error() || status.is_server_error() {
        let code = status.as_u16();
        let kind = if status.is_client_error() {
            FetchErrorKind::ClientError(code)
        } else {
            FetchErrorKind::ServerError(code)
        };
        return FetchResult::Failed(FetchError {
            url: url.to_string(),
            kind,
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::Failed(classify_request_error(url, &e)),
    }
}

fn classify_request_error(url: &str, e: &reqwest::Error) -> FetchError {
    let kind = if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_connect() {
        FetchErrorKind::Unreachable
    } else if let Some(status) = e.status() {
        if status.is_server_error() {
            FetchErrorKind::ServerError(status.as_u16())
        } else {
            FetchErrorKind::ClientError(status.as_u16())
        }
    } else {
        FetchErrorKind::Other
    };

    FetchError {
        url: url.to_string(),
        kind,
        message: e.to_string(),
    }
}
