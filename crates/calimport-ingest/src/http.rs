//! HTTP fetcher for calendar feeds.
//!
//! A plain GET with a timeout and a user agent. Status codes are mapped to
//! [`ImportErrorCode`](crate::ImportErrorCode) categories so callers can tell
//! a dead link from a flaky server.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{trace, warn};
use url::Url;

use crate::error::{ImportError, ImportResult};
use crate::services::{BoxFuture, Fetcher};

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calimport/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches calendar documents over HTTP(S).
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    /// Creates a fetcher with the given configuration.
    pub fn new(config: HttpConfig) -> ImportResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ImportError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    async fn get(&self, url: &str) -> ImportResult<String> {
        let parsed = validate_url(url)?;

        trace!(url = %parsed, "Sending request");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ImportError::network(format!("Request failed: {}", e)).with_source(e))?;

        handle_response(response).await
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, ImportResult<String>> {
        let url = url.to_string();
        Box::pin(async move { self.get(&url).await })
    }
}

/// Accepts only absolute `http` and `https` URLs.
fn validate_url(url: &str) -> ImportResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| ImportError::configuration(format!("Invalid URL {url:?}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ImportError::configuration(format!(
            "Unsupported URL scheme {other:?}"
        ))),
    }
}

/// Handles the HTTP response and extracts the body.
async fn handle_response(response: Response) -> ImportResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    match status {
        s if s.is_success() => response
            .text()
            .await
            .map_err(|e| ImportError::network(format!("Failed to read response: {}", e))),
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            Err(ImportError::not_found(format!("Calendar not found ({})", status)))
        }
        s if s.is_server_error() => Err(ImportError::server(format!("Server error ({})", s))),
        s => {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %s, body = %body, "Unexpected response status");
            Err(ImportError::invalid_response(format!(
                "Unexpected status {}",
                s
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportErrorCode;

    #[test]
    fn default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("calimport/"));
    }

    #[test]
    fn config_builder() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tests/1.0");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "tests/1.0");
    }

    #[test]
    fn fetcher_creation() {
        let fetcher = HttpFetcher::new(HttpConfig::default()).unwrap();
        assert_eq!(fetcher.name(), "http");
        assert_eq!(fetcher.config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.org/cal.ics").is_ok());
        assert!(validate_url("http://example.org/cal.ics").is_ok());

        let err = validate_url("webcal://example.org/cal.ics").unwrap_err();
        assert_eq!(err.code(), ImportErrorCode::ConfigurationError);

        let err = validate_url("not a url").unwrap_err();
        assert_eq!(err.code(), ImportErrorCode::ConfigurationError);
    }
}
