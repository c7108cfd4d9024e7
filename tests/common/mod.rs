use async_trait::async_trait;
use laec_scraper::error::{Result, ScraperError};
use laec_scraper::types::PageSource;
use std::collections::HashMap;

/// In-memory page source: serves pre-rendered documents by URL, so
/// extractor tests run without any network or rendering machinery.
#[derive(Default)]
pub struct StubPageSource {
    pages: HashMap<String, String>,
    listing_pages: HashMap<(String, usize), String>,
}

impl StubPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_listing_page(mut self, url: &str, page: usize, body: &str) -> Self {
        self.listing_pages
            .insert((url.to_string(), page), body.to_string());
        self
    }
}

#[async_trait]
impl PageSource for StubPageSource {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::Venue {
                message: format!("no stub page for {}", url),
            })
    }

    async fn fetch_listing_page(&self, url: &str, page: usize) -> Result<Option<String>> {
        if let Some(body) = self.listing_pages.get(&(url.to_string(), page)) {
            return Ok(Some(body.clone()));
        }
        if page == 1 {
            return Ok(Some(self.fetch_page(url).await?));
        }
        Ok(None)
    }
}
