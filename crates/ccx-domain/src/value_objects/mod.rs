//! Domain value objects
//!
//! Immutable types without identity: embeddings, search requests and results,
//! progress snapshots.

pub mod embedding;
pub mod progress;
pub mod search;

pub use embedding::{Embedding, SparseVector};
pub use progress::{FailureKind, ProgressError, ProgressRecord, ProgressStatus};
pub use search::{ChunkPayload, QueryFilters, QueryRequest, SearchHit, SearchResponse};
