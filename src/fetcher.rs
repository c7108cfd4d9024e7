//! HTTP-backed page acquisition. This is the external collaborator side of
//! the [`PageSource`] boundary: it owns the browser-like User-Agent and the
//! polite delay between fetches, so the extraction pipeline itself never
//! initiates a wait.

use crate::error::Result;
use crate::types::PageSource;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct HttpPageSource {
    client: reqwest::Client,
    fetch_delay: Duration,
}

impl Default for HttpPageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageSource {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_secs(2))
    }

    pub fn with_delay(fetch_delay: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            fetch_delay,
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        debug!("HTTP GET {}", url);
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    async fn fetch_listing_page(&self, url: &str, page: usize) -> Result<Option<String>> {
        let page_url = if page <= 1 {
            url.to_string()
        } else {
            format!("{}&page={}", url, page)
        };
        Ok(Some(self.fetch_page(&page_url).await?))
    }
}
