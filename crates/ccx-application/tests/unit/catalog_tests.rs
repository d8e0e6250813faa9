//! Catalog and clear behavior

use tokio_util::sync::CancellationToken;

use ccx_application::IndexMode;
use ccx_domain::ports::CollectionRegistry;
use ccx_domain::scope::DatasetSelector;

use crate::test_utils::{harness, local_job, write_corpus, HarnessOptions};

#[tokio::test]
async fn listings_report_collection_bindings_and_counts() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path(), &[("a.md", "alpha content\n")]);
    h.indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let summaries = h.catalog.list_datasets("acme").await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "local");
    assert!(summaries[0].point_count >= 1);
    assert_eq!(
        summaries[0].collection_name.as_deref(),
        Some("project_acme_dataset_local")
    );

    let stats = h
        .catalog
        .dataset_stats("acme", "local")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.chunk_count, summaries[0].point_count);
    assert_eq!(stats.file_count, 1);
}

#[tokio::test]
async fn dry_run_clear_reports_counts_without_mutating() {
    let h = harness(HarnessOptions::default()).await;
    let dir = tempfile::tempdir().unwrap();
    write_corpus(
        dir.path(),
        &[("a.md", "alpha content\n"), ("b.md", "beta content\n")],
    );
    h.indexer
        .index(
            local_job("acme", "local", dir.path(), IndexMode::Full),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let selector = DatasetSelector::One("local".into());
    let dry = h
        .catalog
        .clear("acme", Some(&selector), true)
        .await
        .unwrap();
    assert_eq!(dry.datasets, 1);
    assert_eq!(dry.chunks, 2);
    assert_eq!(dry.points, 2);
    assert_eq!(dry.collections, 1);

    // nothing was removed
    assert!(h.registry.resolve("acme", "local").await.unwrap().is_some());
    assert_eq!(h.catalog.list_datasets("acme").await.unwrap().len(), 1);

    // a real clear removes everything the dry run promised
    let real = h
        .catalog
        .clear("acme", Some(&selector), false)
        .await
        .unwrap();
    assert_eq!(real.chunks, dry.chunks);
    assert_eq!(real.collections, dry.collections);

    assert_eq!(h.registry.resolve("acme", "local").await.unwrap(), None);
    assert!(h.catalog.list_datasets("acme").await.unwrap().is_empty());
    let stats = h.catalog.dataset_stats("acme", "local").await.unwrap();
    assert!(stats.is_none());
}

#[tokio::test]
async fn clear_of_unknown_project_is_an_empty_report() {
    let h = harness(HarnessOptions::default()).await;
    let report = h.catalog.clear("ghost", None, false).await.unwrap();
    assert_eq!(report.datasets, 0);
    assert_eq!(report.chunks, 0);
}

#[tokio::test]
async fn clear_with_glob_selector_only_touches_matches() {
    let h = harness(HarnessOptions::default()).await;
    for dataset in ["github-main", "docs"] {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), &[("a.md", "content\n")]);
        h.indexer
            .index(
                local_job("acme", dataset, dir.path(), IndexMode::Full),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
    }

    let selector = DatasetSelector::parse("github-*");
    h.catalog
        .clear("acme", Some(&selector), false)
        .await
        .unwrap();

    assert_eq!(h.registry.resolve("acme", "github-main").await.unwrap(), None);
    assert!(h.registry.resolve("acme", "docs").await.unwrap().is_some());
}
