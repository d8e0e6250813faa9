//! Crawler runtime port
//!
//! The crawler runtime is an external collaborator: it fetches one URL and
//! returns normalized markdown plus the outbound links it discovered. Link
//! harvesting always goes through `links`, never regex over the markdown.

use async_trait::async_trait;

use crate::error::Result;

/// One fetched page as returned by the crawler runtime
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// Normalized markdown rendering of the page
    pub markdown: String,
    /// Outbound links discovered by the crawler's native link extraction
    pub links: Vec<String>,
}

/// Page fetching service
#[async_trait]
pub trait CrawlFetcher: Send + Sync {
    /// Fetch a page and normalize it to markdown
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;

    /// Fetch a URL's raw body without markdown conversion (sitemap XML)
    async fn fetch_raw(&self, url: &str) -> Result<String>;

    /// Identifier for logs and health reports
    fn provider_name(&self) -> &str;
}
