//! Service assembly
//!
//! Builds every provider and service from the loaded configuration. No
//! ambient registries: each collaborator is constructed here and injected
//! explicitly, so tests can assemble the same graph from fakes.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use ccx_application::crawl::CrawlOptions;
use ccx_application::retrieval::RetrievalOptions;
use ccx_application::{
    CatalogService, CrawlStrategy, EmbeddingGateway, IndexingCoordinator, RetrievalPipeline,
    SmartQueryService,
};
use ccx_domain::ports::{
    CollectionRegistry, DenseEmbedder, MetadataStore, Reranker, SparseEmbedder,
    VectorStoreProvider,
};
use ccx_domain::{Error, Result};
use ccx_infrastructure::config::AppConfig;
use ccx_infrastructure::defaults::defaults_path;
use ccx_infrastructure::{ProgressTracker, SysinfoMemoryMonitor};
use ccx_providers::{
    HttpCrawlFetcher, HttpDenseEmbedder, HttpReranker, HttpSparseEmbedder, InMemoryVectorStore,
    LibsqlMetadataStore, OpenAiCompatClient, QdrantVectorStore, SyntaxChunker,
};

use crate::state::AppContext;

/// Assemble the full service graph
pub async fn build_context(config: AppConfig) -> Result<Arc<AppContext>> {
    let timeout = Duration::from_secs(config.embedding.timeout_secs);
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

    // Relational store doubles as the collection registry.
    let metadata_path = config.metadata_path_expanded();
    if let Some(parent) = metadata_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("failed to create data directory: {e}")))?;
    }
    let store = Arc::new(LibsqlMetadataStore::open(&metadata_path.to_string_lossy()).await?);
    let metadata: Arc<dyn MetadataStore> = store.clone();
    let registry: Arc<dyn CollectionRegistry> = store;

    let vectors: Arc<dyn VectorStoreProvider> = match config.stores.vector_backend.as_str() {
        "memory" => Arc::new(InMemoryVectorStore::new()),
        _ => Arc::new(QdrantVectorStore::new(
            config.stores.vector_url.clone(),
            config.stores.vector_api_key.clone(),
            timeout,
            http_client.clone(),
        )),
    };

    let dense: Arc<dyn DenseEmbedder> = Arc::new(HttpDenseEmbedder::new(
        config.embedding.dense_url.clone(),
        config.embedding.api_key.clone(),
        config.embedding.dimension,
        timeout,
        http_client.clone(),
    ));
    let sparse: Option<Arc<dyn SparseEmbedder>> = if config.retrieval.enable_hybrid_search {
        config.embedding.sparse_url.as_ref().map(|url| {
            Arc::new(HttpSparseEmbedder::new(
                url.clone(),
                config.embedding.api_key.clone(),
                timeout,
                http_client.clone(),
            )) as Arc<dyn SparseEmbedder>
        })
    } else {
        None
    };
    let reranker: Option<Arc<dyn Reranker>> = if config.retrieval.enable_reranking {
        config.embedding.rerank_url.as_ref().map(|url| {
            Arc::new(HttpReranker::new(
                url.clone(),
                config.embedding.api_key.clone(),
                timeout,
                http_client.clone(),
            )) as Arc<dyn Reranker>
        })
    } else {
        None
    };

    let gateway = Arc::new(
        EmbeddingGateway::new(dense, sparse, reranker)
            .with_batch_size(config.embedding.batch_size),
    );
    let hybrid = gateway.hybrid_enabled();

    let progress = ProgressTracker::new_shared();
    progress.spawn_sweeper(Duration::from_secs(60));

    let chunker = Arc::new(SyntaxChunker::new());
    let indexer = Arc::new(
        IndexingCoordinator::new(
            metadata.clone(),
            registry.clone(),
            vectors.clone(),
            gateway.clone(),
            chunker,
            progress.clone(),
            hybrid,
        )
        .with_write_batch_size(config.embedding.batch_size),
    );

    let retrieval = Arc::new(
        RetrievalPipeline::new(
            metadata.clone(),
            registry.clone(),
            vectors.clone(),
            gateway.clone(),
        )
        .with_options(RetrievalOptions {
            rerank_initial_k: config.retrieval.rerank_initial_k,
        }),
    );

    let fetcher = Arc::new(HttpCrawlFetcher::new(
        config.crawl.crawler_url.clone(),
        Duration::from_millis(config.crawl.page_timeout_ms),
        http_client.clone(),
    ));
    let crawl = Arc::new(CrawlStrategy::new(
        fetcher,
        indexer.clone(),
        Arc::new(SysinfoMemoryMonitor::new()),
        progress.clone(),
        CrawlOptions {
            batch_size: config.crawl.batch_size,
            max_concurrent: config.crawl.max_concurrent,
            memory_threshold_percent: config.crawl.memory_threshold_percent,
            page_timeout: Duration::from_millis(config.crawl.page_timeout_ms),
        },
    ));

    let catalog = Arc::new(CatalogService::new(
        metadata.clone(),
        registry.clone(),
        vectors.clone(),
    ));

    let smart_query = config.llm.api_key.as_ref().map(|api_key| {
        Arc::new(SmartQueryService::new(
            retrieval.clone(),
            Arc::new(OpenAiCompatClient::new(
                config.llm.api_base.clone(),
                api_key.clone(),
                config.llm.model.clone(),
                config.llm.max_tokens,
                config.llm.temperature,
                Duration::from_secs(120),
                http_client,
            )),
        ))
    });

    info!(
        vector_backend = %config.stores.vector_backend,
        hybrid,
        reranking = config.retrieval.enable_reranking,
        "service graph assembled"
    );

    Ok(Arc::new(AppContext {
        defaults_path: defaults_path()?,
        metadata,
        registry,
        vectors,
        gateway,
        indexer,
        retrieval,
        crawl,
        catalog,
        smart_query,
        progress,
        cancel: CancellationToken::new(),
        config,
    }))
}
