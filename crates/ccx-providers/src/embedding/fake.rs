//! Deterministic fake embedding providers
//!
//! Used in tests and no-dependency development setups. Vectors are derived
//! purely from the input text: identical text always produces identical
//! vectors, so exact-content queries retrieve their chunk at rank 1.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use ccx_domain::ports::{DenseEmbedder, Reranker, SparseEmbedder};
use ccx_domain::value_objects::{Embedding, SparseVector};
use ccx_domain::{Error, Result};

/// Vocabulary size for the hashed sparse space
const SPARSE_SPACE: u32 = 30_000;

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn token_bucket(token: &str, space: u32) -> u32 {
    let digest = Sha256::digest(token.as_bytes());
    let raw = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
    raw % space
}

/// Hash-based bag-of-words dense embedder
pub struct FakeDenseEmbedder {
    dimensions: usize,
    fail: bool,
}

impl FakeDenseEmbedder {
    /// Create a working fake with the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: false,
        }
    }

    /// Create a fake that errors on every call
    pub fn failing(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: true,
        }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let bucket = token_bucket(&token, self.dimensions as u32) as usize;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Embedding::new(vector)
    }
}

#[async_trait]
impl DenseEmbedder for FakeDenseEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if self.fail {
            return Err(Error::embedding("fake dense embedder configured to fail"));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "dense-fake"
    }
}

/// Hashed term-frequency sparse embedder
pub struct FakeSparseEmbedder {
    fail: bool,
}

impl FakeSparseEmbedder {
    /// Create a working fake
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// Create a fake that errors on every call
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn embed_one(text: &str) -> SparseVector {
        let mut frequencies: HashMap<u32, f32> = HashMap::new();
        for token in tokenize(text) {
            *frequencies.entry(token_bucket(&token, SPARSE_SPACE)).or_insert(0.0) += 1.0;
        }
        let mut pairs: Vec<(u32, f32)> = frequencies.into_iter().collect();
        pairs.sort_by_key(|(index, _)| *index);
        SparseVector {
            indices: pairs.iter().map(|(i, _)| *i).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }
}

impl Default for FakeSparseEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SparseEmbedder for FakeSparseEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        if self.fail {
            return Err(Error::embedding("fake sparse embedder configured to fail"));
        }
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }

    fn provider_name(&self) -> &str {
        "sparse-fake"
    }
}

/// Token-overlap reranker
pub struct FakeReranker {
    fail: bool,
}

impl FakeReranker {
    /// Create a working fake
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// Create a fake that errors on every call
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for FakeReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for FakeReranker {
    async fn rerank(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::embedding("fake reranker configured to fail"));
        }
        let query_tokens: std::collections::HashSet<String> =
            tokenize(query).into_iter().collect();
        Ok(passages
            .iter()
            .map(|passage| {
                let tokens = tokenize(passage);
                if tokens.is_empty() {
                    return 0.0;
                }
                let overlap = tokens
                    .iter()
                    .filter(|t| query_tokens.contains(*t))
                    .count();
                overlap as f32 / tokens.len() as f32
            })
            .collect())
    }

    fn provider_name(&self) -> &str {
        "rerank-fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = FakeDenseEmbedder::new(64);
        let a = embedder
            .embed_batch(&["fn hello() {}".to_string()])
            .await
            .unwrap();
        let b = embedder
            .embed_batch(&["fn hello() {}".to_string()])
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn sparse_indices_are_sorted() {
        let embedder = FakeSparseEmbedder::new();
        let vectors = embedder
            .embed_batch(&["authenticate user token session".to_string()])
            .await
            .unwrap();
        let indices = &vectors[0].indices;
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn reranker_prefers_overlapping_passages() {
        let reranker = FakeReranker::new();
        let scores = reranker
            .rerank(
                "database connection",
                &[
                    "opens a database connection".to_string(),
                    "renders the sidebar".to_string(),
                ],
            )
            .await
            .unwrap();
        assert!(scores[0] > scores[1]);
    }
}
