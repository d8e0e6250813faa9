//! Chunk entity and content hashing
//!
//! A chunk is the indivisible unit of retrievable text. Chunk ids are
//! deterministic: the same dataset, path, byte span and document digest always
//! hash to the same id, so re-indexing unchanged content upserts in place.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of the symbol a chunk was extracted from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Free function
    Function,
    /// Method on a type or class
    Method,
    /// Class, struct, enum, trait or interface
    Class,
    /// Module or namespace
    Module,
    /// Anything else the splitter recognized
    Other,
}

impl SymbolKind {
    /// Stable string form used in store payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Module => "module",
            SymbolKind::Other => "other",
        }
    }

    /// Parse the stable string form; unknown strings map to `Other`
    pub fn parse(s: &str) -> SymbolKind {
        match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "module" => SymbolKind::Module,
            _ => SymbolKind::Other,
        }
    }
}

/// Symbol metadata extracted by the chunker
///
/// Every field is optional; absent means the splitter could not determine it.
/// Fields are never guessed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolInfo {
    /// Symbol name
    pub name: Option<String>,
    /// Symbol kind
    pub kind: Option<SymbolKind>,
    /// Declaration signature (first line of the declaration)
    pub signature: Option<String>,
    /// Enclosing symbol name
    pub parent: Option<String>,
    /// Leading documentation text
    pub docstring: Option<String>,
}

/// A unit of retrievable text with location and symbol metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Deterministic chunk id (hex SHA-256)
    pub id: String,
    /// Owning dataset id
    pub dataset_id: String,
    /// Source file path or page URL
    pub source_path: String,
    /// Language identifier ("rust", "markdown", ...)
    pub language: String,
    /// 1-based first line within the normalized document
    pub start_line: u32,
    /// 1-based last line within the normalized document (inclusive)
    pub end_line: u32,
    /// Byte offset of the chunk start within the normalized document
    pub start_byte: usize,
    /// Byte offset one past the chunk end within the normalized document
    pub end_byte: usize,
    /// Canonical (normalized) chunk text
    pub content: String,
    /// Digest of the whole normalized source document; shared by all chunks
    /// of one document and used for incremental skip decisions
    pub content_digest: String,
    /// Symbol metadata where available
    #[serde(default)]
    pub symbol: SymbolInfo,
}

impl Chunk {
    /// Normalize source text: CRLF becomes LF, trailing whitespace is trimmed
    /// per line. The normalized form feeds both the embedding and the id hash.
    pub fn normalize(content: &str) -> String {
        let unified = content.replace("\r\n", "\n");
        let mut out = String::with_capacity(unified.len());
        let mut lines = unified.split('\n').peekable();
        while let Some(line) = lines.next() {
            out.push_str(line.trim_end());
            if lines.peek().is_some() {
                out.push('\n');
            }
        }
        out
    }

    /// Hex SHA-256 digest of normalized document content
    pub fn digest(normalized: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Deterministic chunk id over the identifying tuple
    pub fn compute_id(
        dataset_id: &str,
        source_path: &str,
        start_byte: usize,
        end_byte: usize,
        content_digest: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(dataset_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(source_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(start_byte.to_le_bytes());
        hasher.update(end_byte.to_le_bytes());
        hasher.update(content_digest.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_crlf_and_trailing_whitespace() {
        let raw = "fn main() {  \r\n    println!(\"hi\");\t\r\n}\r\n";
        let normalized = Chunk::normalize(raw);
        assert_eq!(normalized, "fn main() {\n    println!(\"hi\");\n}\n");
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = "line one   \r\nline two\r\n";
        let once = Chunk::normalize(raw);
        assert_eq!(Chunk::normalize(&once), once);
    }

    #[test]
    fn chunk_id_depends_only_on_identifying_tuple() {
        let digest = Chunk::digest("let x = 1;");
        let a = Chunk::compute_id("ds-1", "src/lib.rs", 0, 10, &digest);
        let b = Chunk::compute_id("ds-1", "src/lib.rs", 0, 10, &digest);
        assert_eq!(a, b);

        let other_dataset = Chunk::compute_id("ds-2", "src/lib.rs", 0, 10, &digest);
        assert_ne!(a, other_dataset);

        let other_span = Chunk::compute_id("ds-1", "src/lib.rs", 0, 11, &digest);
        assert_ne!(a, other_span);

        let other_digest = Chunk::digest("let x = 2;");
        let changed = Chunk::compute_id("ds-1", "src/lib.rs", 0, 10, &other_digest);
        assert_ne!(a, changed);
    }

    #[test]
    fn chunk_id_is_hex_sha256() {
        let id = Chunk::compute_id("d", "p", 0, 1, "digest");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
