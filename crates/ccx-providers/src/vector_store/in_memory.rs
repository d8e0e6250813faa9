//! In-memory vector store
//!
//! Development and test backend. Dense scoring is cosine similarity with a
//! top-k min-heap; sparse scoring is a dot product. The store cannot fuse
//! server-side, so the pipeline falls back to client-side RRF for hybrid
//! queries. Data is lost on restart.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;

use ccx_domain::ports::{PointFilter, ScoredPoint, VectorPoint, VectorStoreProvider};
use ccx_domain::value_objects::{Embedding, SparseVector};
use ccx_domain::{Error, Result};

struct CollectionData {
    dimensions: usize,
    hybrid: bool,
    points: HashMap<String, VectorPoint>,
}

/// In-memory vector store keyed by collection name
pub struct InMemoryVectorStore {
    collections: DashMap<String, CollectionData>,
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    fn top_k<F>(&self, collection: &str, filter: &PointFilter, limit: usize, score: F) -> Result<Vec<ScoredPoint>>
    where
        F: Fn(&VectorPoint) -> f64,
    {
        // Missing collections yield empty results, not errors: the dataset
        // filter already guarantees isolation.
        let Some(data) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut heap: BinaryHeap<HeapItem> = BinaryHeap::with_capacity(limit + 1);
        for point in data.points.values() {
            if !filter.matches(&point.payload) {
                continue;
            }
            let candidate = HeapItem {
                score: score(point),
                id: point.id.clone(),
            };
            if heap.len() < limit {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        let mut items: Vec<HeapItem> = heap.into_vec();
        items.sort();
        Ok(items
            .into_iter()
            .map(|item| {
                let point = &data.points[&item.id];
                ScoredPoint {
                    id: item.id,
                    score: item.score,
                    payload: point.payload.clone(),
                    content: point.content.clone(),
                }
            })
            .collect())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Max-heap entry ordered worst-first so the heap root is the eviction
/// candidate; ties order by id for determinism
struct HeapItem {
    score: f64,
    id: String,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower score sorts greater (heap root = worst); equal scores keep
        // the lexicographically smaller id.
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

fn cosine(query: &[f32], candidate: &[f32], query_norm: f32) -> f64 {
    if query.len() != candidate.len() || query_norm == 0.0 {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut candidate_norm = 0.0f32;
    for (q, c) in query.iter().zip(candidate) {
        dot += q * c;
        candidate_norm += c * c;
    }
    let candidate_norm = candidate_norm.sqrt();
    if candidate_norm == 0.0 {
        return 0.0;
    }
    f64::from(dot / (query_norm * candidate_norm))
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    fn provider_name(&self) -> &str {
        "in_memory"
    }

    fn hybrid_supported(&self) -> bool {
        false
    }

    async fn ensure_collection(&self, name: &str, dimensions: usize, hybrid: bool) -> Result<()> {
        match self.collections.get(name) {
            Some(existing) if existing.dimensions != dimensions => Err(Error::vector_db(format!(
                "collection '{name}' exists with dimension {}, requested {dimensions}",
                existing.dimensions
            ))),
            Some(_) => Ok(()),
            None => {
                self.collections.insert(
                    name.to_string(),
                    CollectionData {
                        dimensions,
                        hybrid,
                        points: HashMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.contains_key(name))
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.collections.remove(name);
        Ok(())
    }

    async fn upsert_points(&self, collection: &str, points: &[VectorPoint]) -> Result<()> {
        let mut data = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::vector_db(format!("collection '{collection}' not found")))?;
        for point in points {
            if point.dense.dimensions != data.dimensions {
                return Err(Error::vector_db(format!(
                    "point {} has dimension {}, collection expects {}",
                    point.id, point.dense.dimensions, data.dimensions
                )));
            }
            if point.sparse.is_some() && !data.hybrid {
                return Err(Error::vector_db(format!(
                    "collection '{collection}' has no sparse slot"
                )));
            }
            data.points.insert(point.id.clone(), point.clone());
        }
        Ok(())
    }

    async fn count_points(&self, collection: &str, dataset_id: Option<&str>) -> Result<u64> {
        let Some(data) = self.collections.get(collection) else {
            return Ok(0);
        };
        let count = match dataset_id {
            Some(dataset_id) => data
                .points
                .values()
                .filter(|p| p.payload.dataset_id == dataset_id)
                .count(),
            None => data.points.len(),
        };
        Ok(count as u64)
    }

    async fn query_dense(
        &self,
        collection: &str,
        query: &Embedding,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let query_norm = query.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        self.top_k(collection, filter, limit, |point| {
            cosine(&query.vector, &point.dense.vector, query_norm)
        })
    }

    async fn query_sparse(
        &self,
        collection: &str,
        query: &SparseVector,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        self.top_k(collection, filter, limit, |point| {
            point
                .sparse
                .as_ref()
                .map(|sparse| f64::from(query.dot(sparse)))
                .unwrap_or(0.0)
        })
    }

    async fn query_hybrid(
        &self,
        _collection: &str,
        _dense: &Embedding,
        _sparse: &SparseVector,
        _filter: &PointFilter,
        _limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        Err(Error::vector_db(
            "in_memory store has no server-side fusion; fuse client-side",
        ))
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccx_domain::value_objects::ChunkPayload;

    fn point(id: &str, dataset: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.to_string(),
            dense: Embedding::new(vector),
            sparse: None,
            payload: ChunkPayload {
                project_id: "p".into(),
                dataset_id: dataset.into(),
                source_path: format!("src/{id}.rs"),
                language: "rust".into(),
                symbol_name: None,
                repo: None,
            },
            content: format!("content of {id}"),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2, false).await.unwrap();
        store
            .upsert_points("c", &[point("a", "d1", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_points("c", &[point("a", "d1", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.count_points("c", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dense_query_ranks_by_cosine_and_respects_filter() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2, false).await.unwrap();
        store
            .upsert_points(
                "c",
                &[
                    point("close", "d1", vec![1.0, 0.1]),
                    point("far", "d1", vec![0.0, 1.0]),
                    point("other-dataset", "d2", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let filter = PointFilter::datasets(vec!["d1".to_string()]);
        let hits = store
            .query_dense("c", &Embedding::new(vec![1.0, 0.0]), &filter, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["close", "far"]);
    }

    #[tokio::test]
    async fn missing_collection_queries_return_empty() {
        let store = InMemoryVectorStore::new();
        let filter = PointFilter::datasets(vec!["d1".to_string()]);
        let hits = store
            .query_dense("absent", &Embedding::new(vec![1.0]), &filter, 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2, false).await.unwrap();
        let result = store
            .upsert_points("c", &[point("a", "d1", vec![1.0, 0.0, 0.0])])
            .await;
        assert!(result.is_err());
    }
}
