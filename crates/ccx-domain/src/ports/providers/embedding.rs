//! Embedding provider ports
//!
//! Three capabilities with a uniform `texts -> vectors` shape. The dense
//! embedder is a hard dependency of both indexing and querying; the sparse
//! embedder and reranker are optional and the pipeline degrades without them.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{Embedding, SparseVector};

/// Dense (semantic) embedding service
#[async_trait]
pub trait DenseEmbedder: Send + Sync {
    /// Embed a batch of texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Dimensionality of produced vectors
    fn dimensions(&self) -> usize;

    /// Identifier for logs and health reports
    fn provider_name(&self) -> &str;

    /// Probe the service
    async fn health(&self) -> Result<()> {
        self.embed_batch(&["ping".to_string()]).await.map(|_| ())
    }
}

/// Sparse (lexical) embedding service; used only when hybrid search is enabled
#[async_trait]
pub trait SparseEmbedder: Send + Sync {
    /// Embed a batch of texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>>;

    /// Identifier for logs and health reports
    fn provider_name(&self) -> &str;
}

/// Cross-encoder reranking service
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score `(query, passage)` pairs; returns one score per passage in order
    async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;

    /// Identifier for logs and health reports
    fn provider_name(&self) -> &str;
}
