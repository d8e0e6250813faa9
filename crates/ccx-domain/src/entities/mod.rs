//! Domain entities
//!
//! Identity-bearing types persisted by the relational store or owned by the
//! vector store. Everything is keyed by stable string ids, never by parent
//! pointers.

pub mod chunk;
pub mod collection;
pub mod crawl;
pub mod project;

pub use chunk::{Chunk, SymbolInfo, SymbolKind};
pub use collection::{CollectionRecord, VectorDbKind};
pub use crawl::CrawlPage;
pub use project::{Dataset, DatasetStatus, Project};
