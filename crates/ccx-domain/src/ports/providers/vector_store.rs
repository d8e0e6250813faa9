//! Vector store provider port
//!
//! Contract for stores that persist dense (and optionally sparse) vectors in
//! named collections. Every query carries a `PointFilter` whose `dataset_ids`
//! member is the authoritative isolation boundary; collection-name scoping is
//! a performance optimization on top of it.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{ChunkPayload, Embedding, SparseVector};

/// A vector-store record for one chunk, keyed by chunk id
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Point id; equals the chunk id
    pub id: String,
    /// Dense vector
    pub dense: Embedding,
    /// Sparse vector when hybrid indexing is enabled
    pub sparse: Option<SparseVector>,
    /// Scalar payload
    pub payload: ChunkPayload,
    /// Chunk content, stored for retrieval
    pub content: String,
}

/// Scalar filter applied to every query
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    /// Mandatory dataset isolation; empty matches nothing useful and callers
    /// must not issue queries with it empty
    pub dataset_ids: Vec<String>,
    /// Optional language restriction
    pub language: Option<String>,
    /// Optional source-path prefix restriction
    pub path_prefix: Option<String>,
    /// Optional repository restriction
    pub repo: Option<String>,
}

impl PointFilter {
    /// Filter for a set of dataset ids with no extra restrictions
    pub fn datasets<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            dataset_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether a payload passes this filter
    pub fn matches(&self, payload: &ChunkPayload) -> bool {
        if !self.dataset_ids.iter().any(|id| id == &payload.dataset_id) {
            return false;
        }
        if let Some(language) = &self.language {
            if &payload.language != language {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !payload.source_path.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(repo) = &self.repo {
            if payload.repo.as_deref() != Some(repo.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A scored point returned from a query
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Chunk id
    pub id: String,
    /// Similarity or fused score, higher is better
    pub score: f64,
    /// Stored payload
    pub payload: ChunkPayload,
    /// Stored chunk content
    pub content: String,
}

/// Vector storage backend
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Identifier for logs and registry records
    fn provider_name(&self) -> &str;

    /// Whether the store can fuse dense and sparse queries server-side
    fn hybrid_supported(&self) -> bool;

    /// Create the collection if missing, with the given dense dimension and,
    /// when `hybrid` is set, a sparse vector slot
    async fn ensure_collection(&self, name: &str, dimensions: usize, hybrid: bool) -> Result<()>;

    /// Whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Delete a collection and all its points
    async fn drop_collection(&self, name: &str) -> Result<()>;

    /// Insert or overwrite points, keyed by point id
    async fn upsert_points(&self, collection: &str, points: &[VectorPoint]) -> Result<()>;

    /// Count points, optionally restricted to one dataset
    async fn count_points(&self, collection: &str, dataset_id: Option<&str>) -> Result<u64>;

    /// Dense-only similarity query
    async fn query_dense(
        &self,
        collection: &str,
        query: &Embedding,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Sparse-only similarity query
    async fn query_sparse(
        &self,
        collection: &str,
        query: &SparseVector,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Hybrid query with server-side RRF fusion
    ///
    /// Implementations that report `hybrid_supported() == false` return a
    /// `VectorDb` error here; the pipeline falls back to issuing the two
    /// single-modality queries and fusing client-side.
    async fn query_hybrid(
        &self,
        collection: &str,
        dense: &Embedding,
        sparse: &SparseVector,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Probe the store
    async fn health(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(dataset: &str, path: &str, language: &str) -> ChunkPayload {
        ChunkPayload {
            project_id: "p".into(),
            dataset_id: dataset.into(),
            source_path: path.into(),
            language: language.into(),
            symbol_name: None,
            repo: None,
        }
    }

    #[test]
    fn filter_enforces_dataset_isolation() {
        let filter = PointFilter::datasets(vec!["ds-a".to_string()]);
        assert!(filter.matches(&payload("ds-a", "src/a.rs", "rust")));
        assert!(!filter.matches(&payload("ds-b", "src/a.rs", "rust")));
    }

    #[test]
    fn filter_applies_caller_restrictions() {
        let filter = PointFilter {
            dataset_ids: vec!["ds-a".into()],
            language: Some("rust".into()),
            path_prefix: Some("src/".into()),
            repo: None,
        };
        assert!(filter.matches(&payload("ds-a", "src/a.rs", "rust")));
        assert!(!filter.matches(&payload("ds-a", "docs/a.md", "rust")));
        assert!(!filter.matches(&payload("ds-a", "src/a.py", "python")));
    }
}
