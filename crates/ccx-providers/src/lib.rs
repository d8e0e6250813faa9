//! Provider adapters for claude-context
//!
//! Implementations of the domain ports: HTTP embedding clients, vector
//! stores (Qdrant REST and in-memory), the libsql metadata store and
//! registry, the crawler client, the LLM client and the syntax-aware
//! chunker. Deterministic fakes for every external service live beside the
//! real clients so tests can swap them in.

pub mod chunking;
pub mod crawler;
pub mod embedding;
pub mod llm;
pub mod metadata;
pub mod utils;
pub mod vector_store;

pub use chunking::SyntaxChunker;
pub use crawler::{FakeCrawlFetcher, HttpCrawlFetcher};
pub use embedding::{
    FakeDenseEmbedder, FakeReranker, FakeSparseEmbedder, HttpDenseEmbedder, HttpReranker,
    HttpSparseEmbedder,
};
pub use llm::OpenAiCompatClient;
pub use metadata::LibsqlMetadataStore;
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
