//! Sparse embedding HTTP client
//!
//! Calls `POST {base}/sparse/batch` with `{"texts": [...]}` and expects one
//! `{"indices": [u32], "values": [f32]}` object per input text, in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use ccx_domain::ports::SparseEmbedder;
use ccx_domain::value_objects::SparseVector;
use ccx_domain::{Error, Result};

use crate::utils::check_and_parse;

/// HTTP client for the sparse embedding service
pub struct HttpSparseEmbedder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: Client,
}

impl HttpSparseEmbedder {
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

    fn parse_vector(value: &serde_json::Value) -> Result<SparseVector> {
        let indices: Vec<u32> = value["indices"]
            .as_array()
            .ok_or_else(|| Error::embedding("sparse response missing indices"))?
            .iter()
            .map(|v| v.as_u64().unwrap_or(0) as u32)
            .collect();
        let values: Vec<f32> = value["values"]
            .as_array()
            .ok_or_else(|| Error::embedding("sparse response missing values"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        if indices.len() != values.len() {
            return Err(Error::embedding(format!(
                "sparse vector has {} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        Ok(SparseVector { indices, values })
    }
}

#[async_trait]
impl SparseEmbedder for HttpSparseEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::json!({ "texts": texts });
        let mut request = self
            .http_client
            .post(format!(
                "{}/sparse/batch",
                self.base_url.trim_end_matches('/')
            ))
            .timeout(self.timeout)
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding(format!("sparse transport failed: {e}")))?;
        let body = check_and_parse(response, "sparse").await?;

        let rows = body
            .as_array()
            .or_else(|| body["vectors"].as_array())
            .ok_or_else(|| Error::embedding("sparse response is not an array"))?;
        if rows.len() != texts.len() {
            return Err(Error::embedding(format!(
                "sparse service returned {} vectors for {} texts",
                rows.len(),
                texts.len()
            )));
        }
        rows.iter().map(Self::parse_vector).collect()
    }

    fn provider_name(&self) -> &str {
        "sparse-http"
    }
}
