//! Reranker HTTP client
//!
//! Calls `POST {base}/rerank` with `{"query": ..., "passages": [...]}` and
//! expects `{"scores": [f32]}`, one score per passage in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use ccx_domain::ports::Reranker;
use ccx_domain::{Error, Result};

use crate::utils::check_and_parse;

/// HTTP client for the cross-encoder reranking service
pub struct HttpReranker {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: Client,
}

impl HttpReranker {
    /// Create a client
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
        http_client: Client,
    ) -> Self {
        Self {
            base_url,
            api_key,
            timeout,
            http_client,
        }
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::json!({ "query": query, "passages": passages });
        let mut request = self
            .http_client
            .post(format!("{}/rerank", self.base_url.trim_end_matches('/')))
            .timeout(self.timeout)
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding(format!("rerank transport failed: {e}")))?;
        let body = check_and_parse(response, "reranker").await?;

        let scores: Vec<f32> = body["scores"]
            .as_array()
            .ok_or_else(|| Error::embedding("rerank response missing scores"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        if scores.len() != passages.len() {
            return Err(Error::embedding(format!(
                "reranker returned {} scores for {} passages",
                scores.len(),
                passages.len()
            )));
        }
        Ok(scores)
    }

    fn provider_name(&self) -> &str {
        "rerank-http"
    }
}
