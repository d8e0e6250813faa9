//! Crawl strategy behavior against the fake crawler

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ccx_application::crawl::CrawlOptions;
use ccx_application::{CrawlMode, CrawlRequest, CrawlStrategy};
use ccx_domain::entities::Chunk;
use ccx_domain::ports::{MemoryPressure, MetadataStore, ProgressSink};
use ccx_domain::scope::Scope;
use ccx_domain::value_objects::ProgressStatus;
use ccx_infrastructure::StaticMemoryMonitor;
use ccx_providers::FakeCrawlFetcher;

use crate::test_utils::{harness, Harness, HarnessOptions};

fn strategy(h: &Harness, fetcher: FakeCrawlFetcher) -> CrawlStrategy {
    CrawlStrategy::new(
        Arc::new(fetcher),
        h.indexer.clone(),
        Arc::new(StaticMemoryMonitor::new(10.0)) as Arc<dyn MemoryPressure>,
        h.progress.clone() as Arc<dyn ProgressSink>,
        CrawlOptions::default(),
    )
}

fn site() -> FakeCrawlFetcher {
    FakeCrawlFetcher::new()
        .with_page(
            "https://docs.example.com/",
            "# Welcome\n\ngetting started guide\n",
            &[
                "https://docs.example.com/install",
                "https://docs.example.com/api",
                "https://other.example.org/external",
            ],
        )
        .with_page(
            "https://docs.example.com/install",
            "# Install\n\ninstallation steps\n",
            &["https://docs.example.com/api"],
        )
        .with_page(
            "https://docs.example.com/api",
            "# API\n\nendpoint reference\n",
            &["https://docs.example.com/deep"],
        )
        .with_page(
            "https://docs.example.com/deep",
            "# Deep\n\nburied page\n",
            &[],
        )
}

fn request(mode: CrawlMode, seeds: Vec<&str>) -> CrawlRequest {
    CrawlRequest {
        scope: Scope::new("acme", "docs"),
        seeds: seeds.into_iter().map(str::to_string).collect(),
        mode,
        max_depth: 2,
        max_pages: 30,
        same_domain_only: true,
    }
}

#[tokio::test]
async fn recursive_crawl_respects_depth_and_stays_on_domain() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());

    let outcome = strategy
        .crawl(
            &request(CrawlMode::Recursive, vec!["https://docs.example.com/"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // depth 0: root; depth 1: install, api; depth 2: deep. external is off-domain.
    assert_eq!(outcome.pages_fetched, 4);
    assert!(outcome.chunks_stored >= 4);

    let record = h.progress.snapshot(&outcome.operation_id).unwrap();
    assert_eq!(record.status, ProgressStatus::Completed);
}

#[tokio::test]
async fn max_pages_caps_the_crawl() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());

    let mut req = request(CrawlMode::Recursive, vec!["https://docs.example.com/"]);
    req.max_pages = 2;
    let outcome = strategy.crawl(&req, &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.pages_fetched, 2);
}

#[tokio::test]
async fn single_mode_fetches_only_the_first_seed() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());

    let outcome = strategy
        .crawl(
            &request(
                CrawlMode::Single,
                vec!["https://docs.example.com/", "https://docs.example.com/install"],
            ),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.pages_fetched, 1);
}

#[tokio::test]
async fn batch_mode_fetches_every_seed_without_recursion() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());

    let outcome = strategy
        .crawl(
            &request(
                CrawlMode::Batch,
                vec!["https://docs.example.com/", "https://docs.example.com/install"],
            ),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    // links are not followed in batch mode
    assert_eq!(outcome.pages_fetched, 2);
}

#[tokio::test]
async fn sitemap_mode_parses_the_sitemap_and_never_indexes_it() {
    let h = harness(HarnessOptions::default()).await;
    let sitemap_url = "https://docs.example.com/sitemap.xml";
    let sitemap_xml = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://docs.example.com/install</loc></url>
  <url><loc>https://docs.example.com/api</loc></url>
</urlset>"#;
    let fetcher = site().with_raw(sitemap_url, sitemap_xml);
    let strategy = strategy(&h, fetcher);

    let mut req = request(CrawlMode::Sitemap, vec![sitemap_url]);
    req.max_pages = 1;
    let outcome = strategy.crawl(&req, &CancellationToken::new()).await.unwrap();

    // even with max_pages=1 the sitemap itself was parsed, not fetched as a page
    assert_eq!(outcome.pages_fetched, 1);

    let project = h.metadata.get_project("acme").await.unwrap().unwrap();
    let dataset = h
        .metadata
        .get_dataset(&project.id, "docs")
        .await
        .unwrap()
        .unwrap();
    let xml_digest = Chunk::digest(&Chunk::normalize(sitemap_xml));
    assert!(!h
        .metadata
        .chunk_exists(&dataset.id, sitemap_url, &xml_digest)
        .await
        .unwrap());
}

#[tokio::test]
async fn crawled_pages_are_retrievable_afterwards() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());
    strategy
        .crawl(
            &request(CrawlMode::Recursive, vec!["https://docs.example.com/"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let response = h
        .retrieval
        .search(&ccx_domain::value_objects::QueryRequest::new(
            "acme",
            ccx_domain::scope::DatasetSelector::One("docs".into()),
            "installation steps",
        ))
        .await
        .unwrap();
    assert!(!response.hits.is_empty());
    assert_eq!(
        response.hits[0].payload.source_path,
        "https://docs.example.com/install"
    );
}

#[tokio::test]
async fn cancellation_stops_the_crawl() {
    let h = harness(HarnessOptions::default()).await;
    let strategy = strategy(&h, site());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = strategy
        .crawl(
            &request(CrawlMode::Recursive, vec!["https://docs.example.com/"]),
            &cancel,
        )
        .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn dead_links_are_skipped_without_failing_the_crawl() {
    let h = harness(HarnessOptions::default()).await;
    let fetcher = FakeCrawlFetcher::new().with_page(
        "https://docs.example.com/",
        "root page\n",
        &["https://docs.example.com/missing"],
    );
    let strategy = strategy(&h, fetcher);

    let outcome = strategy
        .crawl(
            &request(CrawlMode::Recursive, vec!["https://docs.example.com/"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.pages_fetched, 1);
}
