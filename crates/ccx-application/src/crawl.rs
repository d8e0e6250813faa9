//! Crawl strategy
//!
//! Depth-level crawling with memory-adaptive dispatch. The frontier is
//! partitioned into batches; within a batch a bounded number of fetches run
//! concurrently, and new dispatches wait while resident memory sits above the
//! configured threshold. Outbound links come from the crawler's native link
//! field only. Fetched pages are handed to the indexing coordinator as one
//! page batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ccx_domain::constants::{
    DEFAULT_CRAWL_BATCH_SIZE, DEFAULT_CRAWL_MAX_CONCURRENT, DEFAULT_CRAWL_PAGE_TIMEOUT_MS,
    DEFAULT_MEMORY_THRESHOLD_PERCENT,
};
use ccx_domain::entities::CrawlPage;
use ccx_domain::ports::{CrawlFetcher, MemoryPressure, ProgressSink};
use ccx_domain::scope::Scope;
use ccx_domain::value_objects::FailureKind;
use ccx_domain::{Error, Result};

use crate::indexing::{IndexJob, IndexMode, IndexSource, IndexingCoordinator};

/// How the seed list is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Fetch exactly the first seed; applies only when explicitly requested,
    /// never inferred from a one-element frontier
    Single,
    /// Fetch every seed, no recursion
    Batch,
    /// Depth-level recursive crawl from the seeds
    Recursive,
    /// Parse each seed as a sitemap and fetch the URLs it lists; the sitemap
    /// URL itself is never indexed
    Sitemap,
}

impl CrawlMode {
    /// Parse the wire form used by tools and the HTTP surface
    pub fn parse(raw: &str) -> Result<CrawlMode> {
        match raw.to_ascii_lowercase().as_str() {
            "single" => Ok(CrawlMode::Single),
            "batch" => Ok(CrawlMode::Batch),
            "recursive" => Ok(CrawlMode::Recursive),
            "sitemap" => Ok(CrawlMode::Sitemap),
            other => Err(Error::invalid_argument(format!("unknown crawl mode: {other}"))),
        }
    }
}

/// Crawl tuning options
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Frontier partition size
    pub batch_size: usize,
    /// Concurrent fetches within a batch
    pub max_concurrent: usize,
    /// Used-memory percentage above which dispatch pauses
    pub memory_threshold_percent: f32,
    /// Per-page fetch timeout
    pub page_timeout: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_CRAWL_BATCH_SIZE,
            max_concurrent: DEFAULT_CRAWL_MAX_CONCURRENT,
            memory_threshold_percent: DEFAULT_MEMORY_THRESHOLD_PERCENT,
            page_timeout: Duration::from_millis(DEFAULT_CRAWL_PAGE_TIMEOUT_MS),
        }
    }
}

/// One crawl job
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Target scope for the indexed pages
    pub scope: Scope,
    /// Seed URLs
    pub seeds: Vec<String>,
    /// Seed interpretation
    pub mode: CrawlMode,
    /// Maximum recursion depth (seeds are depth 0)
    pub max_depth: u32,
    /// Hard page cap across all depths
    pub max_pages: usize,
    /// Restrict harvested links to the seed domains
    pub same_domain_only: bool,
}

/// Result of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Progress key of this crawl
    pub operation_id: String,
    /// Pages fetched successfully
    pub pages_fetched: u64,
    /// Chunks stored by the indexing pass
    pub chunks_stored: u64,
}

/// Runs crawl jobs and feeds the results into indexing
pub struct CrawlStrategy {
    fetcher: Arc<dyn CrawlFetcher>,
    indexer: Arc<IndexingCoordinator>,
    memory: Arc<dyn MemoryPressure>,
    progress: Arc<dyn ProgressSink>,
    options: CrawlOptions,
}

impl CrawlStrategy {
    /// Create a strategy
    pub fn new(
        fetcher: Arc<dyn CrawlFetcher>,
        indexer: Arc<IndexingCoordinator>,
        memory: Arc<dyn MemoryPressure>,
        progress: Arc<dyn ProgressSink>,
        options: CrawlOptions,
    ) -> Self {
        Self {
            fetcher,
            indexer,
            memory,
            progress,
            options,
        }
    }

    /// Mint a progress key for a crawl operation
    pub fn make_operation_id() -> String {
        format!("crawl:{}", uuid::Uuid::new_v4())
    }

    /// Run one crawl job to completion, then index the fetched pages
    pub async fn crawl(
        &self,
        request: &CrawlRequest,
        cancel: &CancellationToken,
    ) -> Result<CrawlOutcome> {
        let operation_id = Self::make_operation_id();
        self.crawl_tracked(request, cancel, &operation_id).await
    }

    /// Run one crawl job under a caller-supplied progress key
    pub async fn crawl_tracked(
        &self,
        request: &CrawlRequest,
        cancel: &CancellationToken,
        operation_id: &str,
    ) -> Result<CrawlOutcome> {
        self.progress
            .begin(operation_id, &request.scope.project, &request.scope.dataset);

        match self.run(request, cancel, operation_id).await {
            Ok(outcome) => {
                self.progress.complete(&operation_id);
                Ok(outcome)
            }
            Err(e) => {
                let kind = if e.is_cancelled() {
                    FailureKind::Cancelled
                } else if e.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Error
                };
                self.progress.fail(&operation_id, kind, &e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &CrawlRequest,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<CrawlOutcome> {
        self.progress.phase(key, "building frontier");
        let mut frontier = self.initial_frontier(request).await?;
        let allowed_hosts: HashSet<String> =
            request.seeds.iter().filter_map(|u| host_of(u)).collect();

        let mut visited: HashSet<String> = frontier.iter().cloned().collect();
        let mut pages: Vec<CrawlPage> = Vec::new();
        let recurse = request.mode == CrawlMode::Recursive;
        let mut depth = 0u32;

        self.progress.phase(key, "fetching");
        while !frontier.is_empty() && pages.len() < request.max_pages {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("crawl aborted"));
            }

            let budget = request.max_pages - pages.len();
            let level: Vec<String> = frontier.drain(..).take(budget).collect();
            self.progress.add_expected(key, level.len() as u64);

            let mut next_frontier: Vec<String> = Vec::new();
            for batch in level.chunks(self.options.batch_size) {
                let fetched = self.fetch_batch(batch, depth, cancel, key).await?;
                for page in fetched {
                    if recurse && depth < request.max_depth {
                        for link in &page.outbound_links {
                            if request.same_domain_only {
                                match host_of(link) {
                                    Some(host) if allowed_hosts.contains(&host) => {}
                                    _ => continue,
                                }
                            }
                            if visited.insert(link.clone()) {
                                next_frontier.push(link.clone());
                            }
                        }
                    }
                    pages.push(page);
                    if pages.len() >= request.max_pages {
                        break;
                    }
                }
                if pages.len() >= request.max_pages {
                    break;
                }
            }

            depth += 1;
            if !recurse || depth > request.max_depth {
                break;
            }
            frontier = next_frontier;
        }

        info!(pages = pages.len(), "crawl fetched, indexing");
        self.progress.phase(key, "indexing");
        let pages_fetched = pages.len() as u64;

        let mut tags = std::collections::HashMap::new();
        tags.insert("src".to_string(), "docs".to_string());
        let outcome = self
            .indexer
            .index(
                IndexJob {
                    scope: request.scope.clone(),
                    source: IndexSource::Pages(pages),
                    mode: IndexMode::Incremental,
                    tags,
                },
                cancel,
            )
            .await?;

        Ok(CrawlOutcome {
            operation_id: key.to_string(),
            pages_fetched,
            chunks_stored: outcome.chunks_stored,
        })
    }

    /// Fetch one batch with bounded concurrency and memory-adaptive dispatch
    async fn fetch_batch(
        &self,
        urls: &[String],
        depth: u32,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<Vec<CrawlPage>> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent));
        let mut tasks: JoinSet<Option<CrawlPage>> = JoinSet::new();

        for url in urls {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("crawl aborted mid-batch"));
            }
            self.wait_for_memory(cancel).await?;

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| Error::crawl("crawl semaphore closed"))?;
            let fetcher = Arc::clone(&self.fetcher);
            let url = url.clone();
            let timeout = self.options.page_timeout;
            tasks.spawn(async move {
                let _permit = permit;
                match tokio::time::timeout(timeout, fetcher.fetch_page(&url)).await {
                    Ok(Ok(page)) => Some(CrawlPage {
                        url: page.url,
                        depth,
                        markdown: page.markdown,
                        outbound_links: page.links,
                        fetched_at: chrono::Utc::now(),
                    }),
                    Ok(Err(e)) => {
                        warn!(url = %url, error = %e, "fetch failed, skipping page");
                        None
                    }
                    Err(_) => {
                        warn!(url = %url, "fetch timed out, skipping page");
                        None
                    }
                }
            });
        }

        let mut pages = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(page)) => {
                    self.progress.add_stored(key, 1);
                    pages.push(page);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "fetch task panicked"),
            }
        }
        Ok(pages)
    }

    /// Pause while resident memory sits above the threshold
    async fn wait_for_memory(&self, cancel: &CancellationToken) -> Result<()> {
        while self.memory.used_percent() >= self.options.memory_threshold_percent {
            if cancel.is_cancelled() {
                return Err(Error::cancelled("crawl aborted while throttled"));
            }
            debug!("memory above threshold, pausing dispatch");
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        Ok(())
    }

    /// Build the depth-0 frontier for the requested mode
    async fn initial_frontier(&self, request: &CrawlRequest) -> Result<Vec<String>> {
        if request.seeds.is_empty() {
            return Err(Error::invalid_argument("crawl requires at least one seed URL"));
        }
        match request.mode {
            CrawlMode::Single => Ok(vec![request.seeds[0].clone()]),
            CrawlMode::Batch | CrawlMode::Recursive => Ok(request.seeds.clone()),
            CrawlMode::Sitemap => {
                // Always parse the sitemap XML, even when auto-discovery
                // would treat it as a regular page.
                let mut urls = Vec::new();
                for seed in &request.seeds {
                    let xml = self.fetcher.fetch_raw(seed).await?;
                    let parsed = parse_sitemap(&xml)?;
                    // one level of nested sitemap indexes
                    for nested in parsed.sitemaps {
                        match self.fetcher.fetch_raw(&nested).await {
                            Ok(xml) => urls.extend(parse_sitemap(&xml)?.urls),
                            Err(e) => warn!(url = %nested, error = %e, "nested sitemap unreadable"),
                        }
                    }
                    urls.extend(parsed.urls);
                }
                urls.dedup();
                Ok(urls)
            }
        }
    }
}

/// URLs extracted from one sitemap document
#[derive(Debug, Default)]
struct SitemapEntries {
    /// Page URLs from `<url><loc>` entries
    urls: Vec<String>,
    /// Nested sitemap URLs from `<sitemap><loc>` entries
    sitemaps: Vec<String>,
}

/// Parse sitemap XML, distinguishing page entries from nested sitemap indexes
fn parse_sitemap(xml: &str) -> Result<SitemapEntries> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = SitemapEntries::default();
    let mut in_loc = false;
    let mut in_sitemap_entry = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = true,
                b"sitemap" => in_sitemap_entry = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"sitemap" => in_sitemap_entry = false,
                _ => {}
            },
            Ok(Event::Text(text)) if in_loc => {
                let url = text
                    .unescape()
                    .map_err(|e| Error::crawl(format!("sitemap text decode failed: {e}")))?
                    .trim()
                    .to_string();
                if !url.is_empty() {
                    if in_sitemap_entry {
                        entries.sitemaps.push(url);
                    } else {
                        entries.urls.push(url);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::crawl(format!("sitemap parse failed: {e}"))),
        }
    }
    Ok(entries)
}

/// Extract the host from a URL string
fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitemap_parsing_extracts_page_urls() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/b</loc><lastmod>2026-01-01</lastmod></url>
</urlset>"#;
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(
            entries.urls,
            vec!["https://example.com/a", "https://example.com/b"]
        );
        assert!(entries.sitemaps.is_empty());
    }

    #[test]
    fn sitemap_index_entries_are_kept_separate() {
        let xml = r#"<sitemapindex>
  <sitemap><loc>https://example.com/sitemap-docs.xml</loc></sitemap>
</sitemapindex>"#;
        let entries = parse_sitemap(xml).unwrap();
        assert!(entries.urls.is_empty());
        assert_eq!(entries.sitemaps, vec!["https://example.com/sitemap-docs.xml"]);
    }

    #[test]
    fn mode_parsing_rejects_unknown_modes() {
        assert_eq!(CrawlMode::parse("recursive").unwrap(), CrawlMode::Recursive);
        assert_eq!(CrawlMode::parse("SITEMAP").unwrap(), CrawlMode::Sitemap);
        assert!(CrawlMode::parse("spider").is_err());
    }

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://docs.example.com/x"), Some("docs.example.com".into()));
        assert_eq!(host_of("not a url"), None);
    }
}
