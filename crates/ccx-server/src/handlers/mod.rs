//! Tool handlers
//!
//! One handler per `claudeContext.*` tool. Handlers validate their
//! arguments, delegate to the application services and format a text+JSON
//! result.

pub mod catalog;
pub mod clear;
pub mod crawl;
pub mod index;
pub mod init;
pub mod search;
pub mod status;

pub use catalog::{DatasetStatsHandler, ListDatasetsHandler, ListScopesHandler};
pub use clear::ClearHandler;
pub use crawl::CrawlHandler;
pub use index::{IndexGithubHandler, IndexHandler};
pub use init::InitHandler;
pub use search::{SearchHandler, SmartQueryHandler};
pub use status::StatusHandler;
