//! Application layer for claude-context
//!
//! Use cases orchestrating the domain ports: the indexing coordinator, the
//! hybrid retrieval pipeline, the crawl strategy, catalog operations and the
//! optional LLM synthesis stage. Everything here is constructed explicitly
//! with injected `Arc<dyn Port>` collaborators.

pub mod catalog;
pub mod crawl;
pub mod expansion;
pub mod fusion;
pub mod gateway;
pub mod indexing;
pub mod retrieval;
pub mod smart_query;

pub use catalog::{CatalogService, DatasetSummary};
pub use crawl::{CrawlMode, CrawlOutcome, CrawlRequest, CrawlStrategy};
pub use gateway::EmbeddingGateway;
pub use indexing::{IndexMode, IndexOutcome, IndexSource, IndexingCoordinator};
pub use retrieval::RetrievalPipeline;
pub use smart_query::{SmartAnswer, SmartQueryService};
