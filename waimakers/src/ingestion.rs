use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

use common::FetcherConfig;

/// Accept header favouring feed content types.
pub const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, */*";

/// Retrieves raw feed documents.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the document at `url` as text. Any transport error or non-2xx status is an error.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches feeds over HTTP with a fixed timeout and a browser-like User-Agent.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for feed fetching (fetcher.accept_invalid_certs)");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("network error during fetch")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
        }

        let bytes = response.bytes().await.context("failed to read response body")?;
        // Feeds occasionally contain stray invalid bytes; keep the rest of the document.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
