//! In-memory crawler fake
//!
//! Preloaded site graph for tests. Pages and raw bodies are registered up
//! front; unknown URLs fail like a dead link would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use ccx_domain::ports::{CrawlFetcher, FetchedPage};
use ccx_domain::{Error, Result};

/// Fake crawler backed by registered pages
#[derive(Default)]
pub struct FakeCrawlFetcher {
    pages: HashMap<String, FetchedPage>,
    raw: HashMap<String, String>,
    fetch_count: AtomicU64,
}

impl FakeCrawlFetcher {
    /// Create an empty fake
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page with markdown content and outbound links
    pub fn with_page(mut self, url: &str, markdown: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                url: url.to_string(),
                markdown: markdown.to_string(),
                links: links.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    /// Register a raw body (sitemap XML)
    pub fn with_raw(mut self, url: &str, body: &str) -> Self {
        self.raw.insert(url.to_string(), body.to_string());
        self
    }

    /// Pages fetched so far
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CrawlFetcher for FakeCrawlFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::crawl(format!("no registered page for {url}")))
    }

    async fn fetch_raw(&self, url: &str) -> Result<String> {
        self.raw
            .get(url)
            .cloned()
            .ok_or_else(|| Error::crawl(format!("no registered raw body for {url}")))
    }

    fn provider_name(&self) -> &str {
        "crawler-fake"
    }
}
