//! Port contracts
//!
//! Trait boundaries between the application core and its collaborators.
//! Provider ports cover external services (embedding, vector store, crawler,
//! LLM, chunking); infrastructure ports cover persistence and process-local
//! facilities. Implementations are constructed explicitly and injected as
//! `Arc<dyn Trait>` so tests can substitute fakes.

pub mod infrastructure;
pub mod providers;

pub use infrastructure::memory::MemoryPressure;
pub use infrastructure::metadata::{ClearReport, DatasetStats, MetadataStore};
pub use infrastructure::progress::ProgressSink;
pub use infrastructure::registry::{CollectionListing, CollectionRegistry, RegistryUpsert};
pub use providers::chunker::Chunker;
pub use providers::crawler::{CrawlFetcher, FetchedPage};
pub use providers::embedding::{DenseEmbedder, Reranker, SparseEmbedder};
pub use providers::llm::LlmClient;
pub use providers::vector_store::{PointFilter, ScoredPoint, VectorPoint, VectorStoreProvider};
