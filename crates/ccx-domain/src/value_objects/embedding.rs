//! Embedding value objects

use serde::{Deserialize, Serialize};

/// Dense vector embedding of a text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// The embedding vector values
    pub vector: Vec<f32>,
    /// Dimensionality of the vector
    pub dimensions: usize,
}

impl Embedding {
    /// Wrap a raw vector
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self { vector, dimensions }
    }
}

/// Sparse (lexical) vector: parallel index/value arrays
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparseVector {
    /// Token indices with non-zero weight
    pub indices: Vec<u32>,
    /// Weights aligned with `indices`
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Dot product with another sparse vector
    ///
    /// Both operands must have their indices sorted ascending.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let mut score = 0.0;
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    score += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_dot_matches_overlapping_indices_only() {
        let a = SparseVector {
            indices: vec![1, 5, 9],
            values: vec![1.0, 2.0, 3.0],
        };
        let b = SparseVector {
            indices: vec![5, 9, 12],
            values: vec![0.5, 1.0, 4.0],
        };
        assert!((a.dot(&b) - (2.0 * 0.5 + 3.0 * 1.0)).abs() < f32::EPSILON);
    }
}
