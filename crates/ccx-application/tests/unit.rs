//! Unit test suite for ccx-application
//!
//! Run with: `cargo test -p ccx-application --test unit`

mod test_utils;

#[path = "unit/indexing_tests.rs"]
mod indexing_tests;

#[path = "unit/retrieval_tests.rs"]
mod retrieval_tests;

#[path = "unit/crawl_tests.rs"]
mod crawl_tests;

#[path = "unit/catalog_tests.rs"]
mod catalog_tests;
