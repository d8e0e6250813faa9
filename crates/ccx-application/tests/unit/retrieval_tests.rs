//! Retrieval pipeline behavior: isolation, expansion, fusion, degradation

use tokio_util::sync::CancellationToken;

use ccx_application::{expansion, fusion, IndexMode};
use ccx_domain::constants::RRF_K;
use ccx_domain::ports::{CollectionRegistry, MetadataStore, PointFilter, VectorStoreProvider};
use ccx_domain::scope::DatasetSelector;
use ccx_domain::value_objects::{QueryFilters, QueryRequest};

use crate::test_utils::{harness, local_job, write_corpus, Harness, HarnessOptions};

async fn index_two_datasets(h: &Harness) {
    let docs = tempfile::tempdir().unwrap();
    write_corpus(
        docs.path(),
        &[
            ("auth.md", "authentication guide with session cookies\n"),
            ("deploy.md", "deployment handbook for operators\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "docs", docs.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let code = tempfile::tempdir().unwrap();
    write_corpus(
        code.path(),
        &[("auth.md", "auth middleware implementation notes\n")],
    );
    h.indexer
        .index(
            local_job("acme", "github-main", code.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
}

fn query(selector: DatasetSelector, text: &str) -> QueryRequest {
    QueryRequest {
        project: "acme".to_string(),
        dataset_selector: selector,
        query_text: text.to_string(),
        top_k: 10,
        threshold: 0.0,
        filters: QueryFilters::default(),
    }
}

#[tokio::test]
async fn exact_content_is_retrieved_at_rank_one() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            ("a.md", "authentication tokens and session cookies\n"),
            ("b.md", "vector database indexing pipeline\n"),
            ("c.md", "crawler frontier scheduling\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let response = h
        .retrieval
        .search(&query(
            DatasetSelector::One("local".into()),
            "vector database indexing pipeline",
        ))
        .await
        .unwrap();
    assert!(!response.hits.is_empty());
    assert_eq!(response.hits[0].payload.source_path, "b.md");
    assert!(response.hits[0].score > 0.99);
}

#[tokio::test]
async fn dataset_isolation_holds_regardless_of_content_overlap() {
    let h = harness(HarnessOptions::default()).await;
    index_two_datasets(&h).await;

    let only_docs = h
        .retrieval
        .search(&query(DatasetSelector::One("docs".into()), "auth"))
        .await
        .unwrap();
    assert!(!only_docs.hits.is_empty());
    let docs_dataset = &only_docs.hits[0].payload.dataset_id;
    for hit in &only_docs.hits {
        assert_eq!(&hit.payload.dataset_id, docs_dataset);
    }
    assert_eq!(only_docs.datasets_searched, vec!["docs".to_string()]);
}

#[tokio::test]
async fn glob_and_wildcard_selectors_expand_as_specified() {
    let h = harness(HarnessOptions::default()).await;
    index_two_datasets(&h).await;

    let glob = h
        .retrieval
        .search(&query(DatasetSelector::parse("github-*"), "auth"))
        .await
        .unwrap();
    assert_eq!(glob.datasets_searched, vec!["github-main".to_string()]);

    let both = h
        .retrieval
        .search(&query(DatasetSelector::All, "auth"))
        .await
        .unwrap();
    assert_eq!(
        both.datasets_searched,
        vec!["docs".to_string(), "github-main".to_string()]
    );

    let list = h
        .retrieval
        .search(&query(
            DatasetSelector::Many(vec!["docs".into(), "github-main".into()]),
            "auth",
        ))
        .await
        .unwrap();
    assert_eq!(
        list.datasets_searched,
        vec!["docs".to_string(), "github-main".to_string()]
    );
}

#[tokio::test]
async fn wildcard_expansion_is_a_superset_of_any_literal() {
    let h = harness(HarnessOptions::default()).await;
    index_two_datasets(&h).await;
    let project = h.metadata.get_project("acme").await.unwrap().unwrap();

    let all = expansion::expand_selector(h.metadata.as_ref(), &project.id, &DatasetSelector::All)
        .await
        .unwrap();
    let one = expansion::expand_selector(
        h.metadata.as_ref(),
        &project.id,
        &DatasetSelector::One("docs".into()),
    )
    .await
    .unwrap();
    for dataset in &one {
        assert!(all.iter().any(|d| d.id == dataset.id));
    }
}

#[tokio::test]
async fn empty_expansion_yields_empty_response_not_error() {
    let h = harness(HarnessOptions::default()).await;
    index_two_datasets(&h).await;

    let response = h
        .retrieval
        .search(&query(DatasetSelector::One("absent".into()), "auth"))
        .await
        .unwrap();
    assert!(response.hits.is_empty());
    assert!(response.datasets_searched.is_empty());

    // unknown project behaves the same
    let mut request = query(DatasetSelector::All, "auth");
    request.project = "no-such-project".to_string();
    let response = h.retrieval.search(&request).await.unwrap();
    assert!(response.hits.is_empty());
}

#[tokio::test]
async fn datasets_without_collections_are_skipped_not_fabricated() {
    let h = harness(HarnessOptions::default()).await;
    index_two_datasets(&h).await;

    // a dataset row that was never indexed has no registry binding
    let project = h.metadata.get_project("acme").await.unwrap().unwrap();
    h.metadata
        .ensure_dataset(&project.id, "pending", &Default::default())
        .await
        .unwrap();

    let response = h
        .retrieval
        .search(&query(DatasetSelector::All, "auth"))
        .await
        .unwrap();
    assert!(!response.datasets_searched.contains(&"pending".to_string()));
}

#[tokio::test]
async fn hybrid_ordering_equals_client_side_rrf_of_both_lists() {
    let h = harness(HarnessOptions {
        hybrid: true,
        ..Default::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            ("a.md", "token authentication for the http api\n"),
            ("b.md", "database connection pooling\n"),
            ("c.md", "authentication and authorization middleware\n"),
            ("d.md", "frontier scheduling for the crawler\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let request = query(DatasetSelector::One("docs".into()), "authentication middleware");
    let response = h.retrieval.search(&request).await.unwrap();
    assert!(!response.hits.is_empty());

    // recompute expected ordering by hand: dense list + sparse list, RRF k=60
    let project = h.metadata.get_project("acme").await.unwrap().unwrap();
    let dataset = h
        .metadata
        .get_dataset(&project.id, "docs")
        .await
        .unwrap()
        .unwrap();
    let collection = h.registry.resolve("acme", "docs").await.unwrap().unwrap();
    let filter = PointFilter::datasets(vec![dataset.id.clone()]);

    let dense = h.gateway.embed_query(&request.query_text).await.unwrap();
    let sparse = h
        .gateway
        .embed_query_sparse(&request.query_text)
        .await
        .unwrap();
    let dense_hits = h
        .vectors
        .query_dense(&collection, &dense, &filter, request.top_k)
        .await
        .unwrap();
    let sparse_hits = h
        .vectors
        .query_sparse(&collection, &sparse, &filter, request.top_k)
        .await
        .unwrap();
    let fused = fusion::rrf_fuse(vec![dense_hits, sparse_hits], RRF_K);

    let expected: Vec<&str> = fused.iter().map(|p| p.id.as_str()).collect();
    let actual: Vec<&str> = response.hits.iter().map(|h| h.chunk_id.as_str()).collect();
    assert_eq!(actual, &expected[..actual.len()]);
}

#[tokio::test]
async fn failing_sparse_degrades_to_dense_only() {
    let h = harness(HarnessOptions {
        hybrid: true,
        sparse_failing: true,
        ..Default::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("a.md", "session cookie management\n")]);
    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let response = h
        .retrieval
        .search(&query(
            DatasetSelector::One("docs".into()),
            "session cookie management",
        ))
        .await
        .unwrap();
    assert!(!response.hits.is_empty());
    assert_eq!(response.hits[0].payload.source_path, "a.md");
}

#[tokio::test]
async fn reranker_rescores_and_resorts_candidates() {
    let h = harness(HarnessOptions {
        rerank: true,
        ..Default::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            ("exact.md", "rate limiter implementation\n"),
            ("noise.md", "unrelated project roadmap notes\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let response = h
        .retrieval
        .search(&query(
            DatasetSelector::One("docs".into()),
            "rate limiter implementation",
        ))
        .await
        .unwrap();
    assert_eq!(response.hits[0].payload.source_path, "exact.md");
}

#[tokio::test]
async fn caller_filters_restrict_results() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            ("docs/a.md", "pipeline overview for operators\n"),
            ("src/b.md", "pipeline internals for developers\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut request = query(DatasetSelector::One("docs".into()), "pipeline");
    request.filters.path_prefix = Some("docs/".to_string());
    let response = h.retrieval.search(&request).await.unwrap();
    assert!(!response.hits.is_empty());
    for hit in &response.hits {
        assert!(hit.payload.source_path.starts_with("docs/"));
    }
}

#[tokio::test]
async fn threshold_drops_low_scoring_hits() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[
            ("hit.md", "exact phrase match target\n"),
            ("miss.md", "entirely different topic\n"),
        ],
    );
    h.indexer
        .index(
            local_job("acme", "docs", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut request = query(
        DatasetSelector::One("docs".into()),
        "exact phrase match target",
    );
    request.threshold = 0.9;
    let response = h.retrieval.search(&request).await.unwrap();
    assert_eq!(response.hits.len(), 1);
    assert_eq!(response.hits[0].payload.source_path, "hit.md");
}
