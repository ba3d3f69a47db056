//! Page sources
//!
//! This module handles fetching pages for the walker:
//! - The [`PageSource`] trait the walker fetches through
//! - An HTTP implementation with browser-like headers
//! - Per-kind timeouts (index pages and item pages differ)
//! - Error classification into timeouts and transport failures

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Page body
    pub body: String,
}

/// Which kind of page is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Index,
    Item,
}

/// Transient fetch failures; the walker skips the page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },
}

/// Capability to fetch a page by URL
///
/// Any status code counts as a page; only transport failures and timeouts
/// are errors. Block pages are recognised later from their content.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str, kind: PageKind) -> Result<Page, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::FetchConfig;
/// use listing_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageSource`] backed by a reqwest client
pub struct HttpSource {
    client: Client,
    index_timeout: Duration,
    item_timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            index_timeout: Duration::from_secs(config.index_timeout_secs),
            item_timeout: Duration::from_secs(config.item_timeout_secs),
        })
    }

    fn timeout_for(&self, kind: PageKind) -> Duration {
        match kind {
            PageKind::Index => self.index_timeout,
            PageKind::Item => self.item_timeout,
        }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str, kind: PageKind) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "hr-HR,hr;q=0.9,en;q=0.8")
            .timeout(self.timeout_for(kind))
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| classify(url, e))?;

        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
