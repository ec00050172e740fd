//! # studyone-fetch
//!
//! HTTP implementation of [`WebpageFetcher`]: downloads a page with a
//! browser-like User-Agent and extracts its title, description, keywords and
//! a short summary.
//!
//! Fetching never raises. Network errors, timeouts, non-2xx responses and
//! undecodable bodies are all reported as [`FetchOutcome::Failed`].

pub mod extract;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use studyone_core::defaults::{FETCH_TIMEOUT_SECS, FETCH_USER_AGENT};
use studyone_core::{AppConfig, Error, FetchOutcome, Result, WebpageFetcher};

pub use extract::{extract_webpage, html_to_text};

/// Fetches webpages over HTTP(S) with reqwest.
#[derive(Debug, Clone)]
pub struct HttpWebpageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpWebpageFetcher {
    /// Create a fetcher with the given request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    /// Create a fetcher with the default timeout and browser User-Agent.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Duration::from_secs(FETCH_TIMEOUT_SECS), FETCH_USER_AGENT)
    }

    /// Create a fetcher from application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.fetch_timeout, &config.fetch_user_agent)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_html(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| describe_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {} for {}", status, url));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))
    }
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timed out: {}", e)
    } else if e.is_builder() {
        format!("Invalid URL: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

#[async_trait]
impl WebpageFetcher for HttpWebpageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let start = Instant::now();
        debug!(subsystem = "fetch", op = "fetch", url, "Fetching webpage");

        match self.fetch_html(url).await {
            Ok(html) => {
                let data = extract_webpage(url, &html);
                info!(
                    subsystem = "fetch",
                    op = "fetch",
                    url,
                    bytes = html.len(),
                    has_title = data.title.is_some(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Webpage fetched"
                );
                FetchOutcome::Fetched(data)
            }
            Err(error) => {
                warn!(
                    subsystem = "fetch",
                    op = "fetch",
                    url,
                    error = %error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Webpage fetch failed"
                );
                FetchOutcome::Failed {
                    url: url.to_string(),
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_config() {
        let config = AppConfig::from_vars(|_| None).unwrap();
        let fetcher = HttpWebpageFetcher::from_app_config(&config).unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(FETCH_TIMEOUT_SECS));
    }

    #[test]
    fn test_with_defaults_keeps_fixed_timeout() {
        let fetcher = HttpWebpageFetcher::with_defaults().unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(FETCH_TIMEOUT_SECS));
    }

    #[tokio::test]
    async fn test_invalid_url_is_failed_outcome() {
        let fetcher = HttpWebpageFetcher::with_defaults().unwrap();
        let outcome = fetcher.fetch("not a url").await;
        match outcome {
            FetchOutcome::Failed { url, error } => {
                assert_eq!(url, "not a url");
                assert!(!error.is_empty());
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
