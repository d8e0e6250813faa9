//! Shared fixtures: the full service graph over fakes
//!
//! In-memory libsql, in-memory vector store, deterministic fake embedders.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ccx_application::{
    CatalogService, EmbeddingGateway, IndexingCoordinator, RetrievalPipeline,
};
use ccx_domain::ports::{
    CollectionRegistry, DenseEmbedder, MetadataStore, ProgressSink, Reranker, SparseEmbedder,
    VectorStoreProvider,
};
use ccx_infrastructure::ProgressTracker;
use ccx_providers::{
    FakeDenseEmbedder, FakeReranker, FakeSparseEmbedder, InMemoryVectorStore,
    LibsqlMetadataStore, SyntaxChunker,
};

/// Embedding dimension used across the suite
pub const DIMS: usize = 128;

/// Full service graph assembled from fakes
pub struct Harness {
    pub store: Arc<LibsqlMetadataStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub registry: Arc<dyn CollectionRegistry>,
    pub vectors: Arc<dyn VectorStoreProvider>,
    pub gateway: Arc<EmbeddingGateway>,
    pub indexer: Arc<IndexingCoordinator>,
    pub retrieval: Arc<RetrievalPipeline>,
    pub catalog: Arc<CatalogService>,
    pub progress: Arc<ProgressTracker>,
}

/// Capability toggles for a harness
#[derive(Default, Clone, Copy)]
pub struct HarnessOptions {
    pub hybrid: bool,
    pub sparse_failing: bool,
    pub rerank: bool,
}

pub async fn harness(options: HarnessOptions) -> Harness {
    let store = Arc::new(LibsqlMetadataStore::open(":memory:").await.unwrap());
    let metadata: Arc<dyn MetadataStore> = store.clone();
    let registry: Arc<dyn CollectionRegistry> = store.clone();
    let vectors: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());

    let dense: Arc<dyn DenseEmbedder> = Arc::new(FakeDenseEmbedder::new(DIMS));
    let sparse: Option<Arc<dyn SparseEmbedder>> = if options.hybrid {
        Some(if options.sparse_failing {
            Arc::new(FakeSparseEmbedder::failing())
        } else {
            Arc::new(FakeSparseEmbedder::new())
        })
    } else {
        None
    };
    let reranker: Option<Arc<dyn Reranker>> = if options.rerank {
        Some(Arc::new(FakeReranker::new()))
    } else {
        None
    };
    let gateway = Arc::new(EmbeddingGateway::new(dense, sparse, reranker));

    let progress = ProgressTracker::new_shared();
    let progress_sink: Arc<dyn ProgressSink> = progress.clone();

    let indexer = Arc::new(IndexingCoordinator::new(
        metadata.clone(),
        registry.clone(),
        vectors.clone(),
        gateway.clone(),
        Arc::new(SyntaxChunker::new()),
        progress_sink,
        options.hybrid,
    ));
    let retrieval = Arc::new(RetrievalPipeline::new(
        metadata.clone(),
        registry.clone(),
        vectors.clone(),
        gateway.clone(),
    ));
    let catalog = Arc::new(CatalogService::new(
        metadata.clone(),
        registry.clone(),
        vectors.clone(),
    ));

    Harness {
        store,
        metadata,
        registry,
        vectors,
        gateway,
        indexer,
        retrieval,
        catalog,
        progress,
    }
}

/// Write a corpus of files under a directory
pub fn write_corpus(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }
}

/// Build a local-path indexing job
pub fn local_job(
    project: &str,
    dataset: &str,
    root: &Path,
    mode: ccx_application::IndexMode,
) -> ccx_application::indexing::IndexJob {
    ccx_application::indexing::IndexJob {
        scope: ccx_domain::scope::Scope::new(project, dataset),
        source: ccx_application::IndexSource::LocalPath {
            root: root.to_path_buf(),
            repo: None,
        },
        mode,
        tags: HashMap::new(),
    }
}
