//! LLM client port used by the smart-query synthesis stage

use async_trait::async_trait;

use crate::error::Result;

/// Chat-completion style language model client
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return the raw assistant text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier for logs and citations
    fn model(&self) -> &str;
}
