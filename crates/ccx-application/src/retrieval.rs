//! Hybrid retrieval pipeline
//!
//! Query flow: selector expansion -> registry resolution -> query embedding
//! -> per-collection hybrid search with a mandatory dataset scalar filter ->
//! fusion -> optional rerank -> threshold and top-k. The scalar filter is
//! authoritative for isolation; collection-name scoping only narrows the
//! search space.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use ccx_domain::constants::{DEFAULT_RERANK_INITIAL_K, RRF_K};
use ccx_domain::ports::{
    CollectionRegistry, MetadataStore, PointFilter, ScoredPoint, VectorStoreProvider,
};
use ccx_domain::value_objects::{QueryRequest, SearchHit, SearchResponse};
use ccx_domain::Result;

use crate::expansion::expand_selector;
use crate::fusion;
use crate::gateway::EmbeddingGateway;

/// Tuning knobs for the pipeline
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    /// Candidate pool size when reranking is enabled
    pub rerank_initial_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            rerank_initial_k: DEFAULT_RERANK_INITIAL_K,
        }
    }
}

/// Executes hybrid queries over one or more datasets
pub struct RetrievalPipeline {
    metadata: Arc<dyn MetadataStore>,
    registry: Arc<dyn CollectionRegistry>,
    vectors: Arc<dyn VectorStoreProvider>,
    gateway: Arc<EmbeddingGateway>,
    options: RetrievalOptions,
}

impl RetrievalPipeline {
    /// Create a pipeline
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        registry: Arc<dyn CollectionRegistry>,
        vectors: Arc<dyn VectorStoreProvider>,
        gateway: Arc<EmbeddingGateway>,
    ) -> Self {
        Self {
            metadata,
            registry,
            vectors,
            gateway,
            options: RetrievalOptions::default(),
        }
    }

    /// Override tuning options
    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one query
    pub async fn search(&self, request: &QueryRequest) -> Result<SearchResponse> {
        let Some(project) = self.metadata.get_project(&request.project).await? else {
            return Ok(SearchResponse::default());
        };

        let datasets =
            expand_selector(self.metadata.as_ref(), &project.id, &request.dataset_selector)
                .await?;
        if datasets.is_empty() {
            return Ok(SearchResponse::default());
        }

        // Resolve each dataset through the registry; never fabricate names.
        let mut collections: Vec<(String, String)> = Vec::new(); // (dataset name, collection)
        let mut dataset_ids: Vec<String> = Vec::new();
        for dataset in &datasets {
            match self.registry.resolve(&request.project, &dataset.name).await? {
                Some(collection) => {
                    collections.push((dataset.name.clone(), collection));
                    dataset_ids.push(dataset.id.clone());
                }
                None => {
                    warn!(dataset = %dataset.name, "dataset has no collection record, skipping");
                }
            }
        }
        if collections.is_empty() {
            return Ok(SearchResponse::default());
        }

        let fetch_k = if self.gateway.rerank_enabled() {
            self.options.rerank_initial_k.max(request.top_k)
        } else {
            request.top_k
        };

        let dense = self.gateway.embed_query(&request.query_text).await?;
        let sparse = if self.gateway.hybrid_enabled() {
            self.gateway.embed_query_sparse(&request.query_text).await
        } else {
            None
        };

        let filter = PointFilter {
            dataset_ids,
            language: request.filters.language.clone(),
            path_prefix: request.filters.path_prefix.clone(),
            repo: request.filters.repo.clone(),
        };

        // Per-collection queries run in parallel and are joined.
        let queries = collections.iter().map(|(_, collection)| {
            self.query_collection(collection, &dense, sparse.as_ref(), &filter, fetch_k)
        });
        let mut per_collection: Vec<Vec<ScoredPoint>> = Vec::with_capacity(collections.len());
        for result in join_all(queries).await {
            per_collection.push(result?);
        }

        let mut candidates = fusion::merge_candidates(per_collection);

        if self.gateway.rerank_enabled() && !candidates.is_empty() {
            let passages: Vec<String> = candidates
                .iter()
                .map(|p| format!("{}\n{}", p.payload.source_path, p.content))
                .collect();
            if let Some(scores) = self.gateway.rerank(&request.query_text, &passages).await {
                for (candidate, score) in candidates.iter_mut().zip(scores) {
                    candidate.score = f64::from(score);
                }
                fusion::sort_deterministic(&mut candidates);
            }
        }

        let hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter(|p| p.score >= request.threshold)
            .take(request.top_k)
            .map(|p| SearchHit {
                chunk_id: p.id,
                score: p.score,
                payload: p.payload,
                content: p.content,
            })
            .collect();

        debug!(
            hits = hits.len(),
            collections = collections.len(),
            "query finished"
        );
        Ok(SearchResponse {
            hits,
            datasets_searched: collections.into_iter().map(|(name, _)| name).collect(),
        })
    }

    /// Query one collection, branching on store capability
    async fn query_collection(
        &self,
        collection: &str,
        dense: &ccx_domain::value_objects::Embedding,
        sparse: Option<&ccx_domain::value_objects::SparseVector>,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        match sparse {
            Some(sparse) if self.vectors.hybrid_supported() => {
                self.vectors
                    .query_hybrid(collection, dense, sparse, filter, limit)
                    .await
            }
            Some(sparse) => {
                // The store cannot fuse server-side: issue both queries and
                // fuse client-side with the fixed RRF constant.
                let dense_hits = self
                    .vectors
                    .query_dense(collection, dense, filter, limit)
                    .await?;
                let sparse_hits = self
                    .vectors
                    .query_sparse(collection, sparse, filter, limit)
                    .await?;
                let mut fused = fusion::rrf_fuse(vec![dense_hits, sparse_hits], RRF_K);
                fused.truncate(limit);
                Ok(fused)
            }
            None => {
                self.vectors
                    .query_dense(collection, dense, filter, limit)
                    .await
            }
        }
    }
}
