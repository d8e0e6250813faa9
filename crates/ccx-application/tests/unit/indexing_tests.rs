//! Indexing coordinator behavior against the full fake graph

use tokio_util::sync::CancellationToken;

use ccx_application::IndexMode;
use ccx_domain::ports::CollectionRegistry;
use ccx_domain::value_objects::{FailureKind, ProgressStatus};

use crate::test_utils::{harness, local_job, write_corpus, HarnessOptions};

#[tokio::test]
async fn successful_index_registers_collection_and_counts() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            (
                "main.go",
                "package main\n\n// Hello returns a greeting.\nfunc Hello() string {\n\treturn \"hello\"\n}\n",
            ),
            ("README.md", "A greeting service.\n"),
        ],
    );

    let outcome = h
        .indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.chunks_stored >= 2);
    assert_eq!(outcome.files_indexed, 2);
    assert_eq!(
        outcome.collection_name,
        "project_acme_dataset_local"
    );
    // registry resolves and carries the stored point count
    let resolved = h.registry.resolve("acme", "local").await.unwrap();
    assert_eq!(resolved.as_deref(), Some("project_acme_dataset_local"));
    let listings = h.registry.list_for_project("acme").await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].point_count, outcome.point_count);
    assert!(listings[0].last_indexed_at.is_some());
    assert_eq!(outcome.point_count, outcome.chunks_stored);

    // the indexed function is retrievable by name at rank 1
    let response = h
        .retrieval
        .search(&ccx_domain::value_objects::QueryRequest::new(
            "acme",
            ccx_domain::scope::DatasetSelector::One("local".into()),
            "Hello",
        ))
        .await
        .unwrap();
    assert!(!response.hits.is_empty());
    assert_eq!(response.hits[0].payload.source_path, "main.go");
}

#[tokio::test]
async fn empty_corpus_still_creates_the_registry_record() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();

    let outcome = h
        .indexer
        .index(
            local_job("acme", "empty", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.chunks_stored, 0);
    assert_eq!(outcome.point_count, 0);
    let resolved = h.registry.resolve("acme", "empty").await.unwrap();
    assert!(resolved.is_some());
}

#[tokio::test]
async fn incremental_mode_skips_unchanged_documents() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("guide.md", "indexing guide contents\n")]);

    let first = h
        .indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Incremental),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(first.files_indexed, 1);

    let second = h
        .indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Incremental),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(second.chunks_stored, 0);
    assert_eq!(second.files_skipped, 1);

    // forced mode re-embeds the same deterministic ids: count stays stable
    let forced = h
        .indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Forced),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(forced.files_indexed, 1);
    assert_eq!(forced.point_count, first.point_count);
}

#[tokio::test]
async fn changed_content_is_reindexed_incrementally() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("guide.md", "version one\n")]);

    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Incremental),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    write_corpus(dir.path(), &[("guide.md", "version two, heavily rewritten\n")]);
    let second = h
        .indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Incremental),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(second.files_indexed, 1);
    assert!(second.chunks_stored >= 1);
}

#[tokio::test]
async fn completed_progress_has_expected_equal_to_stored() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("a.md", "alpha\n"), ("b.md", "beta\n")]);

    h.indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let record = {
        use ccx_domain::ports::ProgressSink;
        h.progress.snapshot("index:acme/local").unwrap()
    };
    assert_eq!(record.status, ProgressStatus::Completed);
    assert_eq!(record.expected, record.stored);
    assert!(record.ended_at.is_some());
}

#[tokio::test]
async fn cancellation_fails_the_run_with_a_distinguished_cause() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("a.md", "alpha\n")]);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = h
        .indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &cancel,
        )
        .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_cancelled());

    let record = {
        use ccx_domain::ports::ProgressSink;
        h.progress.snapshot("index:acme/local").unwrap()
    };
    assert_eq!(record.status, ProgressStatus::Failed);
    assert_eq!(record.error.unwrap().kind, FailureKind::Cancelled);
}

#[tokio::test]
async fn dense_embedder_failure_is_fatal_and_leaves_registry_untouched() {
    use std::sync::Arc;

    use ccx_application::{EmbeddingGateway, IndexingCoordinator};
    use ccx_domain::ports::{
        CollectionRegistry, DenseEmbedder, MetadataStore, ProgressSink, VectorStoreProvider,
    };
    use ccx_providers::{
        FakeDenseEmbedder, InMemoryVectorStore, LibsqlMetadataStore, SyntaxChunker,
    };

    let store = Arc::new(LibsqlMetadataStore::open(":memory:").await.unwrap());
    let metadata: Arc<dyn MetadataStore> = store.clone();
    let registry: Arc<dyn CollectionRegistry> = store.clone();
    let vectors: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
    let gateway = Arc::new(EmbeddingGateway::new(
        Arc::new(FakeDenseEmbedder::failing(8)) as Arc<dyn DenseEmbedder>,
        None,
        None,
    ));
    let progress = ccx_infrastructure::ProgressTracker::new_shared();
    let indexer = IndexingCoordinator::new(
        metadata,
        registry.clone(),
        vectors,
        gateway,
        Arc::new(SyntaxChunker::new()),
        progress.clone() as Arc<dyn ProgressSink>,
        false,
    );

    let dir = tempfile::tempdir().unwrap();
    crate::test_utils::write_corpus(dir.path(), &[("a.md", "alpha content\n")]);

    let result = indexer
        .index(
            crate::test_utils::local_job("acme", "local", dir.path(), ccx_application::IndexMode::Full),
            &CancellationToken::new(),
        )
        .await;
    assert!(result.is_err());

    // no successful run, so readers see no collection binding
    assert_eq!(registry.resolve("acme", "local").await.unwrap(), None);
    let record = progress.snapshot("index:acme/local").unwrap();
    assert_eq!(record.status, ProgressStatus::Failed);
}
