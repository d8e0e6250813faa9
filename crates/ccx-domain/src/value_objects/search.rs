//! Search request and result value objects

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOP_K;
use crate::scope::DatasetSelector;

/// Payload stored with every vector point
///
/// The `dataset_id` field is the authoritative isolation boundary: a scalar
/// filter on it is sufficient to isolate a dataset even if collection naming
/// disagrees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkPayload {
    /// Owning project id
    pub project_id: String,
    /// Owning dataset id
    pub dataset_id: String,
    /// Source file path or page URL
    pub source_path: String,
    /// Language identifier
    pub language: String,
    /// Symbol name when the chunker extracted one
    pub symbol_name: Option<String>,
    /// Repository identifier for remote-repo ingests
    pub repo: Option<String>,
}

/// Caller-supplied scalar filters applied alongside dataset isolation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryFilters {
    /// Restrict to a language
    pub language: Option<String>,
    /// Restrict to paths starting with this prefix
    pub path_prefix: Option<String>,
    /// Restrict to a repository
    pub repo: Option<String>,
}

/// A hybrid search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Project scoping the query
    pub project: String,
    /// Dataset selector expanded by the scope model
    pub dataset_selector: DatasetSelector,
    /// Natural-language or code query text
    pub query_text: String,
    /// Number of results to return
    pub top_k: usize,
    /// Minimum score; results below it are dropped
    pub threshold: f64,
    /// Additional scalar filters
    pub filters: QueryFilters,
}

impl QueryRequest {
    /// Build a request with defaults for tuning fields
    pub fn new<P: Into<String>, Q: Into<String>>(
        project: P,
        selector: DatasetSelector,
        query_text: Q,
    ) -> Self {
        Self {
            project: project.into(),
            dataset_selector: selector,
            query_text: query_text.into(),
            top_k: DEFAULT_TOP_K,
            threshold: 0.0,
            filters: QueryFilters::default(),
        }
    }
}

/// A single ranked result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Chunk id of the matched chunk
    pub chunk_id: String,
    /// Relevance score (fused or reranked; higher is better)
    pub score: f64,
    /// Point payload
    pub payload: ChunkPayload,
    /// Matched chunk content
    pub content: String,
}

/// Result set for one query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ranked hits, best first
    pub hits: Vec<SearchHit>,
    /// Dataset names that were actually searched
    pub datasets_searched: Vec<String>,
}
