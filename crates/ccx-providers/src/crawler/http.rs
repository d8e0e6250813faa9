//! HTTP client for the crawler runtime
//!
//! The crawler runtime is a sidecar service: `POST {base}/fetch` with
//! `{"url": ...}` returns `{"url", "markdown", "links": [...]}`. Raw bodies
//! (sitemap XML) are fetched directly, bypassing markdown conversion.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use ccx_domain::ports::{CrawlFetcher, FetchedPage};
use ccx_domain::{Error, Result};

/// Client for the external crawler runtime
pub struct HttpCrawlFetcher {
    base_url: String,
    timeout: Duration,
    http_client: Client,
}

impl HttpCrawlFetcher {
    /// Create a client
    pub fn new(base_url: String, timeout: Duration, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http_client,
        }
    }
}

#[async_trait]
impl CrawlFetcher for HttpCrawlFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .http_client
            .post(format!("{}/fetch", self.base_url))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| Error::crawl(format!("crawler transport failed for {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::crawl(format!(
                "crawler returned {status} for {url}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::crawl(format!("crawler response parse failed: {e}")))?;

        let markdown = body["markdown"]
            .as_str()
            .ok_or_else(|| Error::crawl(format!("crawler response missing markdown for {url}")))?
            .to_string();
        let links = body["links"]
            .as_array()
            .map(|links| {
                links
                    .iter()
                    .filter_map(|l| l.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(FetchedPage {
            url: body["url"].as_str().unwrap_or(url).to_string(),
            markdown,
            links,
        })
    }

    async fn fetch_raw(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::crawl(format!("raw fetch failed for {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::crawl(format!("raw fetch returned {status} for {url}")));
        }
        response
            .text()
            .await
            .map_err(|e| Error::crawl(format!("raw body read failed for {url}: {e}")))
    }

    fn provider_name(&self) -> &str {
        "crawler-http"
    }
}
