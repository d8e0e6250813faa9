//! Embedding gateway
//!
//! Aggregates the dense, sparse and reranker clients behind one facade. The
//! dense client is a hard dependency: its failures propagate. Sparse and
//! rerank failures degrade the pipeline to dense-only and are logged once per
//! gateway instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use ccx_domain::constants::DEFAULT_EMBED_BATCH_SIZE;
use ccx_domain::ports::{DenseEmbedder, Reranker, SparseEmbedder};
use ccx_domain::value_objects::{Embedding, SparseVector};
use ccx_domain::Result;

/// Facade over the embedding capability set {dense, sparse, rerank}
pub struct EmbeddingGateway {
    dense: Arc<dyn DenseEmbedder>,
    sparse: Option<Arc<dyn SparseEmbedder>>,
    reranker: Option<Arc<dyn Reranker>>,
    batch_size: usize,
    sparse_warned: AtomicBool,
    rerank_warned: AtomicBool,
}

impl EmbeddingGateway {
    /// Create a gateway; absent clients disable their capability
    pub fn new(
        dense: Arc<dyn DenseEmbedder>,
        sparse: Option<Arc<dyn SparseEmbedder>>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Self {
        Self {
            dense,
            sparse,
            reranker,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            sparse_warned: AtomicBool::new(false),
            rerank_warned: AtomicBool::new(false),
        }
    }

    /// Override the dense batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Dense vector dimensionality
    pub fn dimensions(&self) -> usize {
        self.dense.dimensions()
    }

    /// Whether a sparse client is configured
    pub fn hybrid_enabled(&self) -> bool {
        self.sparse.is_some()
    }

    /// Whether a reranker client is configured
    pub fn rerank_enabled(&self) -> bool {
        self.reranker.is_some()
    }

    /// Embed documents densely, batching and preserving input order.
    /// Dense failures are fatal to the calling operation.
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embeddings = self.dense.embed_batch(batch).await?;
            out.extend(embeddings);
        }
        Ok(out)
    }

    /// Embed one query densely
    pub async fn embed_query(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.dense.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| ccx_domain::Error::embedding("dense service returned no vector"))
    }

    /// Sparse-embed documents; `None` when the capability is absent or the
    /// service failed (degradation, warned once)
    pub async fn embed_documents_sparse(&self, texts: &[String]) -> Option<Vec<SparseVector>> {
        let sparse = self.sparse.as_ref()?;
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            match sparse.embed_batch(batch).await {
                Ok(vectors) => out.extend(vectors),
                Err(e) => {
                    self.warn_sparse(&e);
                    return None;
                }
            }
        }
        Some(out)
    }

    /// Sparse-embed one query; `None` degrades to dense-only
    pub async fn embed_query_sparse(&self, text: &str) -> Option<SparseVector> {
        let sparse = self.sparse.as_ref()?;
        match sparse.embed_batch(&[text.to_string()]).await {
            Ok(mut vectors) => vectors.pop(),
            Err(e) => {
                self.warn_sparse(&e);
                None
            }
        }
    }

    /// Rerank passages; `None` when disabled or failing (degradation)
    pub async fn rerank(&self, query: &str, passages: &[String]) -> Option<Vec<f32>> {
        let reranker = self.reranker.as_ref()?;
        match reranker.rerank(query, passages).await {
            Ok(scores) if scores.len() == passages.len() => Some(scores),
            Ok(scores) => {
                self.warn_rerank(&format!(
                    "score count {} does not match passage count {}",
                    scores.len(),
                    passages.len()
                ));
                None
            }
            Err(e) => {
                self.warn_rerank(&e.to_string());
                None
            }
        }
    }

    /// Probe the dense client
    pub async fn health(&self) -> Result<()> {
        self.dense.health().await
    }

    fn warn_sparse(&self, error: &ccx_domain::Error) {
        if !self.sparse_warned.swap(true, Ordering::Relaxed) {
            warn!(error = %error, "sparse embedding unavailable, degrading to dense-only");
        }
    }

    fn warn_rerank(&self, detail: &str) {
        if !self.rerank_warned.swap(true, Ordering::Relaxed) {
            warn!(detail, "reranker unavailable, keeping fused ordering");
        }
    }
}
