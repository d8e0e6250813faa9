//! Syntax-aware chunker
//!
//! Splits source documents into retrievable chunks. For grammars we carry,
//! top-level declarations are kept whole while below the size limit;
//! oversized containers are descended into; oversized leaves and unknown
//! formats fall back to fixed line windows with overlap. Symbol metadata is
//! extracted where the grammar provides it and left absent otherwise.

pub mod languages;

use tracing::debug;
use tree_sitter::Node;

use ccx_domain::entities::{Chunk, SymbolInfo, SymbolKind};
use ccx_domain::ports::Chunker;

use self::languages::LanguageSpec;

/// Default size limit above which a declaration is split further
const DEFAULT_MAX_CHUNK_BYTES: usize = 3_072;
/// Fallback window height in lines
const DEFAULT_WINDOW_LINES: usize = 60;
/// Fallback window overlap in lines
const DEFAULT_OVERLAP_LINES: usize = 10;
/// Traversal depth bound when descending into containers
const MAX_DESCEND_DEPTH: usize = 4;

/// A byte span plus the symbol metadata extracted for it
struct Piece {
    start_byte: usize,
    end_byte: usize,
    symbol: SymbolInfo,
}

/// Tree-sitter based chunker with windowed fallback
pub struct SyntaxChunker {
    max_chunk_bytes: usize,
    window_lines: usize,
    overlap_lines: usize,
}

impl SyntaxChunker {
    /// Create a chunker with default limits
    pub fn new() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            window_lines: DEFAULT_WINDOW_LINES,
            overlap_lines: DEFAULT_OVERLAP_LINES,
        }
    }

    /// Override the declaration size limit
    pub fn with_max_chunk_bytes(mut self, max: usize) -> Self {
        self.max_chunk_bytes = max.max(256);
        self
    }

    fn syntax_pieces(&self, spec: &LanguageSpec, source: &str) -> Vec<Piece> {
        let mut parser = tree_sitter::Parser::new();
        if parser.set_language(&spec.language()).is_err() {
            return Vec::new();
        }
        let Some(tree) = parser.parse(source, None) else {
            return Vec::new();
        };

        let mut pieces = Vec::new();
        self.visit(spec, tree.root_node(), source, None, 0, &mut pieces);
        pieces.sort_by_key(|p| p.start_byte);
        pieces
    }

    fn visit(
        &self,
        spec: &LanguageSpec,
        node: Node<'_>,
        source: &str,
        parent: Option<&str>,
        depth: usize,
        pieces: &mut Vec<Piece>,
    ) {
        if depth >= MAX_DESCEND_DEPTH {
            return;
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let kind = child.kind();
            if let Some(symbol_kind) = spec.declaration_kind(kind) {
                let span = child.end_byte() - child.start_byte();
                let name = node_name(child, source);

                if span <= self.max_chunk_bytes {
                    pieces.push(self.declaration_piece(
                        spec, child, source, symbol_kind, name, parent,
                    ));
                } else if spec.is_container(kind) {
                    // Too big to keep whole: recurse into member declarations.
                    self.visit(spec, child, source, name.as_deref(), depth + 1, pieces);
                } else {
                    self.window_split_node(child, source, symbol_kind, name, parent, pieces);
                }
            } else if spec.is_passthrough(kind) {
                self.visit(spec, child, source, parent, depth + 1, pieces);
            }
        }
    }

    fn declaration_piece(
        &self,
        spec: &LanguageSpec,
        node: Node<'_>,
        source: &str,
        mut kind: SymbolKind,
        name: Option<String>,
        parent: Option<&str>,
    ) -> Piece {
        if kind == SymbolKind::Function && parent.is_some() {
            kind = SymbolKind::Method;
        }

        // Pull the preceding comment block into the chunk so documentation
        // is embedded with the code it describes.
        let (start_byte, docstring) = leading_comments(node, source);
        let docstring = docstring.or_else(|| body_docstring(spec, node, source));

        Piece {
            start_byte,
            end_byte: node.end_byte(),
            symbol: SymbolInfo {
                name,
                kind: Some(kind),
                signature: signature_of(node, source),
                parent: parent.map(str::to_string),
                docstring,
            },
        }
    }

    fn window_split_node(
        &self,
        node: Node<'_>,
        source: &str,
        kind: SymbolKind,
        name: Option<String>,
        parent: Option<&str>,
        pieces: &mut Vec<Piece>,
    ) {
        let text = &source[node.start_byte()..node.end_byte()];
        for (offset_start, offset_end) in line_windows(text, self.window_lines, self.overlap_lines)
        {
            pieces.push(Piece {
                start_byte: node.start_byte() + offset_start,
                end_byte: node.start_byte() + offset_end,
                symbol: SymbolInfo {
                    name: name.clone(),
                    kind: Some(kind),
                    signature: signature_of(node, source),
                    parent: parent.map(str::to_string),
                    docstring: None,
                },
            });
        }
    }

    fn window_pieces(&self, source: &str) -> Vec<Piece> {
        line_windows(source, self.window_lines, self.overlap_lines)
            .into_iter()
            .map(|(start_byte, end_byte)| Piece {
                start_byte,
                end_byte,
                symbol: SymbolInfo::default(),
            })
            .collect()
    }
}

impl Default for SyntaxChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for SyntaxChunker {
    fn chunk(&self, dataset_id: &str, source_path: &str, content: &str) -> Vec<Chunk> {
        let normalized = Chunk::normalize(content);
        if normalized.trim().is_empty() {
            return Vec::new();
        }
        let digest = Chunk::digest(&normalized);

        let extension = source_path
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let spec = languages::spec_for_extension(&extension);

        let mut pieces = match spec {
            Some(spec) => self.syntax_pieces(spec, &normalized),
            None => Vec::new(),
        };
        let language = match spec {
            Some(spec) => spec.name,
            None => languages::fallback_language(&extension),
        };
        if pieces.is_empty() {
            debug!(path = source_path, "no declarations extracted, using windows");
            pieces = self.window_pieces(&normalized);
        }

        pieces
            .into_iter()
            .filter(|piece| piece.end_byte > piece.start_byte)
            .map(|piece| {
                let content = normalized[piece.start_byte..piece.end_byte].to_string();
                let start_line = 1 + normalized[..piece.start_byte]
                    .bytes()
                    .filter(|b| *b == b'\n')
                    .count() as u32;
                let end_line = start_line + content.bytes().filter(|b| *b == b'\n').count() as u32;
                Chunk {
                    id: Chunk::compute_id(
                        dataset_id,
                        source_path,
                        piece.start_byte,
                        piece.end_byte,
                        &digest,
                    ),
                    dataset_id: dataset_id.to_string(),
                    source_path: source_path.to_string(),
                    language: language.to_string(),
                    start_line,
                    end_line,
                    start_byte: piece.start_byte,
                    end_byte: piece.end_byte,
                    content,
                    content_digest: digest.clone(),
                    symbol: piece.symbol,
                }
            })
            .collect()
    }
}

/// Best-effort symbol name extraction
fn node_name(node: Node<'_>, source: &str) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, source);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind().ends_with("identifier") {
            return node_text(child, source);
        }
        if let Some(name) = child.child_by_field_name("name") {
            return node_text(name, source);
        }
    }
    None
}

fn node_text(node: Node<'_>, source: &str) -> Option<String> {
    source
        .get(node.start_byte()..node.end_byte())
        .map(str::to_string)
}

/// First line of the declaration, as its signature
fn signature_of(node: Node<'_>, source: &str) -> Option<String> {
    let text = source.get(node.start_byte()..node.end_byte())?;
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(160).collect())
}

/// Walk preceding comment siblings; returns the widened start byte and the
/// comment text as a docstring
fn leading_comments(node: Node<'_>, source: &str) -> (usize, Option<String>) {
    let mut start = node.start_byte();
    let mut lines: Vec<String> = Vec::new();
    let mut current = node.prev_sibling();

    while let Some(sibling) = current {
        if !sibling.kind().contains("comment") {
            break;
        }
        // only adjacent comments count (no blank line in between)
        let gap = &source[sibling.end_byte()..start];
        if gap.bytes().filter(|b| *b == b'\n').count() > 1 {
            break;
        }
        if let Some(text) = node_text(sibling, source) {
            lines.push(text);
        }
        start = sibling.start_byte();
        current = sibling.prev_sibling();
    }

    if lines.is_empty() {
        return (node.start_byte(), None);
    }
    lines.reverse();
    let doc = lines
        .iter()
        .map(|line| {
            line.trim_start_matches('/')
                .trim_start_matches('!')
                .trim_start_matches('#')
                .trim_start_matches('*')
                .trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();
    (start, if doc.is_empty() { None } else { Some(doc) })
}

/// Python-style docstring: first string expression in the body block
fn body_docstring(spec: &LanguageSpec, node: Node<'_>, source: &str) -> Option<String> {
    if spec.name != "python" {
        return None;
    }
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body.named_children(&mut cursor).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    let raw = node_text(string, source)?;
    Some(
        raw.trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string(),
    )
}

/// Byte ranges of overlapping line windows over `text`
fn line_windows(text: &str, window: usize, overlap: usize) -> Vec<(usize, usize)> {
    let mut line_starts: Vec<usize> = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    let line_count = line_starts.len();
    let step = window.saturating_sub(overlap).max(1);

    let mut ranges = Vec::new();
    let mut line = 0;
    while line < line_count {
        let end_line = (line + window).min(line_count);
        let start_byte = line_starts[line];
        let end_byte = if end_line == line_count {
            text.len()
        } else {
            line_starts[end_line] - 1
        };
        if text[start_byte..end_byte].trim().is_empty() {
            line += step;
            continue;
        }
        ranges.push((start_byte, end_byte));
        if end_line == line_count {
            break;
        }
        line += step;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUST_SOURCE: &str = r#"use std::fmt;

/// Greets the caller.
pub fn hello() -> String {
    "hello".to_string()
}

pub struct Greeter {
    salutation: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        format!("{} {}", self.salutation, name)
    }
}
"#;

    fn chunker() -> SyntaxChunker {
        SyntaxChunker::new()
    }

    #[test]
    fn rust_declarations_become_chunks_with_symbols() {
        let chunks = chunker().chunk("ds", "src/greeter.rs", RUST_SOURCE);
        assert!(chunks.len() >= 3);

        let hello = chunks
            .iter()
            .find(|c| c.symbol.name.as_deref() == Some("hello"))
            .expect("hello chunk");
        assert_eq!(hello.symbol.kind, Some(SymbolKind::Function));
        assert_eq!(hello.symbol.docstring.as_deref(), Some("Greets the caller."));
        assert!(hello.content.contains("pub fn hello()"));

        let greeter = chunks
            .iter()
            .find(|c| c.symbol.name.as_deref() == Some("Greeter") && c.symbol.kind == Some(SymbolKind::Class));
        assert!(greeter.is_some());
    }

    #[test]
    fn chunk_ids_are_deterministic_across_runs() {
        let a = chunker().chunk("ds", "src/greeter.rs", RUST_SOURCE);
        let b = chunker().chunk("ds", "src/greeter.rs", RUST_SOURCE);
        let ids_a: Vec<&str> = a.iter().map(|c| c.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn crlf_input_chunks_like_lf_input() {
        let crlf = RUST_SOURCE.replace('\n', "\r\n");
        let a = chunker().chunk("ds", "src/greeter.rs", RUST_SOURCE);
        let b = chunker().chunk("ds", "src/greeter.rs", &crlf);
        assert_eq!(
            a.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            b.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unknown_formats_fall_back_to_windows() {
        let prose: String = (0..200)
            .map(|i| format!("line {i} of the handbook\n"))
            .collect();
        let chunks = chunker().chunk("ds", "docs/handbook.md", &prose);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].language, "markdown");
        assert!(chunks[0].symbol.name.is_none());
    }

    #[test]
    fn methods_carry_their_parent() {
        let chunks = chunker().chunk("ds", "src/greeter.rs", RUST_SOURCE);
        // impl Greeter is small enough to stay whole here, so force a split
        let big_impl = format!(
            "impl Greeter {{\n{}\n}}\n",
            (0..200)
                .map(|i| format!("    pub fn method_{i}(&self) -> u32 {{ {i} }}"))
                .collect::<Vec<_>>()
                .join("\n")
        );
        let chunks2 = chunker().chunk("ds", "src/big.rs", &big_impl);
        let method = chunks2
            .iter()
            .find(|c| c.symbol.kind == Some(SymbolKind::Method))
            .expect("method chunk");
        assert_eq!(method.symbol.parent.as_deref(), Some("Greeter"));
        drop(chunks);
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunker().chunk("ds", "src/empty.rs", "   \n  \n").is_empty());
    }

    #[test]
    fn line_window_ranges_cover_text() {
        let text = "a\nb\nc\nd\ne";
        let ranges = line_windows(text, 2, 1);
        assert!(!ranges.is_empty());
        assert_eq!(ranges[0].0, 0);
        assert_eq!(ranges.last().unwrap().1, text.len());
    }
}
