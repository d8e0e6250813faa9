//! OpenAI-compatible chat completion client
//!
//! Used by the smart-query synthesis stage. Works against any service
//! exposing the `/chat/completions` shape, including the legacy MiniMax
//! endpoints configured through the alias environment variables.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use ccx_domain::ports::LlmClient;
use ccx_domain::{Error, Result};

/// Chat-completions HTTP client
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    http_client: Client,
}

impl OpenAiCompatClient {
    /// Create a client
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
            temperature,
            timeout,
            http_client,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let payload = json!({
            "model": &self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::llm(format!("completion transport failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => Error::llm(format!("authentication failed: {body}")),
                _ => Error::llm(format!("completion returned {status}: {body}")),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("completion parse failed: {e}")))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::llm("completion response missing message content"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
