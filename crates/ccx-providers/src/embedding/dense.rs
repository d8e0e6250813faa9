//! Dense embedding HTTP client
//!
//! Calls `POST {base}/embed` with `{"texts": [...]}` and expects
//! `{"vectors": [[f32]], "dimension": D}`. Transport errors are retried
//! once; authentication failures surface as the distinct auth error and are
//! never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use ccx_domain::ports::DenseEmbedder;
use ccx_domain::value_objects::Embedding;
use ccx_domain::{Error, Result};

use crate::utils::{check_and_parse, is_transport_error};

/// HTTP client for the dense embedding service
pub struct HttpDenseEmbedder {
    base_url: String,
    api_key: Option<String>,
    dimensions: usize,
    timeout: Duration,
    http_client: Client,
}

impl HttpDenseEmbedder {
    /// Create a client
    ///
    /// `dimensions` is the dimension the service is expected to produce;
    /// responses disagreeing with it are rejected as a schema mismatch.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        dimensions: usize,
        timeout: Duration,
        http_client: Client,
    ) -> Self {
        Self {
            base_url,
            api_key,
            dimensions,
            timeout,
            http_client,
        }
    }

    async fn send_once(&self, texts: &[String]) -> std::result::Result<serde_json::Value, SendError> {
        let payload = serde_json::json!({ "texts": texts });
        let mut request = self
            .http_client
            .post(format!("{}/embed", self.base_url.trim_end_matches('/')))
            .timeout(self.timeout)
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            if is_transport_error(&e) {
                SendError::Transport(Error::embedding(format!("dense transport failed: {e}")))
            } else {
                SendError::Fatal(Error::embedding(format!("dense request failed: {e}")))
            }
        })?;

        check_and_parse(response, "dense").await.map_err(|e| match e {
            Error::EmbeddingAuth { .. } => SendError::Fatal(e),
            other => SendError::Transport(other),
        })
    }

    fn parse_vectors(&self, body: &serde_json::Value) -> Result<Vec<Embedding>> {
        let dimension = body["dimension"].as_u64().unwrap_or(0) as usize;
        if dimension != 0 && dimension != self.dimensions {
            return Err(Error::embedding(format!(
                "dense service reports dimension {dimension}, expected {}",
                self.dimensions
            )));
        }

        let vectors = body["vectors"]
            .as_array()
            .ok_or_else(|| Error::embedding("dense response missing vectors array"))?;

        vectors
            .iter()
            .map(|row| {
                let values: Vec<f32> = row
                    .as_array()
                    .ok_or_else(|| Error::embedding("dense vector is not an array"))?
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                    .collect();
                if values.len() != self.dimensions {
                    return Err(Error::embedding(format!(
                        "dense vector has {} values, expected {}",
                        values.len(),
                        self.dimensions
                    )));
                }
                Ok(Embedding::new(values))
            })
            .collect()
    }
}

enum SendError {
    /// Retry once
    Transport(Error),
    /// Surface immediately (auth, malformed request)
    Fatal(Error),
}

#[async_trait]
impl DenseEmbedder for HttpDenseEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = match self.send_once(texts).await {
            Ok(body) => body,
            Err(SendError::Fatal(e)) => return Err(e),
            Err(SendError::Transport(first)) => {
                warn!(error = %first, "dense request failed, retrying once");
                match self.send_once(texts).await {
                    Ok(body) => body,
                    Err(SendError::Fatal(e)) | Err(SendError::Transport(e)) => return Err(e),
                }
            }
        };

        self.parse_vectors(&body)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "dense-http"
    }
}
