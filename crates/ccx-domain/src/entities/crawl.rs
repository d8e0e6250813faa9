//! Transient crawl page
//!
//! Held by the crawl strategy until handed to the indexing coordinator; never
//! persisted as its own entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched page awaiting indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPage {
    /// Page URL
    pub url: String,
    /// Depth at which the page was discovered (seeds are depth 0)
    pub depth: u32,
    /// Normalized markdown produced by the crawler runtime
    pub markdown: String,
    /// Outbound links harvested by the crawler's native link API
    pub outbound_links: Vec<String>,
    /// Fetch timestamp
    pub fetched_at: DateTime<Utc>,
}
