//! Chunker port

use crate::entities::Chunk;

/// Splits a source document into ordered, retrievable chunks
///
/// Implementations normalize content (CRLF to LF, trailing whitespace
/// trimmed) before hashing and splitting, so chunk ids are stable across
/// platforms. Chunking is CPU-bound and synchronous.
pub trait Chunker: Send + Sync {
    /// Split one document into ordered chunks with deterministic ids
    fn chunk(&self, dataset_id: &str, source_path: &str, content: &str) -> Vec<Chunk>;
}
