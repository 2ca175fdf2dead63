//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser user agent and fixed timeout
//! - GET requests that follow redirects
//! - Classifying responses into "HTML content" or "no content"
//! - Retrying transient transport faults with backoff

use crate::config::CrawlerConfig;
use crate::crawler::retry::RetryPolicy;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use thiserror::Error;

/// Errors surfaced by a page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {url} after {attempts} attempts: {reason}")]
    Exhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Returns true for faults worth retrying (timeouts, connection
    /// failures, broken bodies, redirect trouble)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => !source.is_builder(),
            Self::Exhausted { .. } | Self::Client(_) => false,
        }
    }

    /// The URL the failure relates to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport { url, .. } | Self::Exhausted { url, .. } => Some(url),
            Self::Client(_) => None,
        }
    }
}

/// Source of page HTML for the traversal
///
/// `Ok(None)` means the URL answered but has nothing to crawl (non-2xx status
/// or a non-HTML content type). `Err` means the URL could not be retrieved.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<String>, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use nav_mapper::config::CrawlerConfig;
/// use nav_mapper::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher backed by `reqwest`, retrying transient faults
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher from crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config).map_err(FetchError::Client)?;
        Ok(Self::with_client(client, RetryPolicy::from_config(config)))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>, FetchError> {
        let result = self
            .policy
            .run(
                |attempt| {
                    tracing::trace!(%url, attempt, "Fetching page");
                    fetch_once(&self.client, url)
                },
                FetchError::is_transient,
            )
            .await;

        match result {
            Err(e) if e.is_transient() => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: self.policy.max_attempts(),
                reason: e.to_string(),
            }),
            other => other,
        }
    }
}

/// Performs a single GET request
///
/// # Response Handling
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with an HTML content type | `Ok(Some(body))` |
/// | 2xx with any other content type | `Ok(None)` |
/// | Non-2xx status (after redirects) | `Ok(None)` |
/// | Transport fault (send or body) | `Err(FetchError::Transport)` |
pub async fn fetch_once(client: &Client, url: &str) -> Result<Option<String>, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "Non-success response, no content");
        return Ok(None);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.contains("html") {
        tracing::warn!(%url, %content_type, "Content type is not HTML, no content");
        return Ok(None);
    }

    let body = response
        .text()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    tracing::debug!(%url, bytes = body.len(), "Fetched HTML");
    Ok(Some(body))
}
