//! Page retrieval collaborators
//!
//! This module handles the HTTP side of an audit:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Fetching page HTML through the [`PageSource`] trait
//! - The optional [`ScreenshotService`] collaborator
//! - Error classification

use crate::config::HttpConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// Redirects use reqwest's default policy (up to ten hops), so statuses are
/// reported for the final response.
///
/// # Example
///
/// ```
/// use content_audit::audit::build_http_client;
/// use content_audit::config::HttpConfig;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.page_timeout_secs))
        .connect_timeout(Duration::from_secs(config.check_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Source of raw page HTML
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the HTML of `url`, or why it could not be retrieved
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages with a GET request
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    /// # Error Handling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Non-2xx final status | `FetchError::Status` |
    /// | Timeout | `FetchError::Timeout` |
    /// | Connection refused / DNS | `FetchError::Connect` |
    /// | Body read failure | `FetchError::Request` |
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))
    }
}

/// Produces a hosted screenshot URL for a page
///
/// Failures are reported as `None` by the caller's contract: a page without
/// a screenshot is still a completed page.
#[async_trait]
pub trait ScreenshotService: Send + Sync {
    async fn capture(&self, url: &str) -> Result<String, String>;
}
