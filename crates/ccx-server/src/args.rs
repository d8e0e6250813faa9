//! Tool argument types
//!
//! One struct per tool; schemas are generated with schemars for the MCP
//! tool listing and inputs are checked with validator before dispatch.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A dataset selector: a single string or a list of names
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SelectorArg {
    /// One selector expression (literal, glob, `*` or `key:value` alias)
    One(String),
    /// An explicit list of dataset names
    Many(Vec<String>),
}

impl SelectorArg {
    /// Convert to the domain selector
    pub fn to_selector(&self) -> ccx_domain::scope::DatasetSelector {
        match self {
            SelectorArg::One(raw) => ccx_domain::scope::DatasetSelector::parse(raw),
            SelectorArg::Many(names) => {
                ccx_domain::scope::DatasetSelector::from_names(names.clone())
            }
        }
    }
}

fn default_top_k() -> usize {
    ccx_domain::constants::DEFAULT_TOP_K
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> usize {
    50
}

fn default_true() -> bool {
    true
}

/// Arguments for the init tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct InitArgs {
    /// Explicit project name
    pub project: Option<String>,
    /// Filesystem path to auto-scope; overrides a conflicting project
    pub path: Option<String>,
    /// Explicit dataset name
    pub dataset: Option<String>,
}

/// Arguments for the index tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct IndexArgs {
    /// Directory to ingest
    #[validate(length(min = 1))]
    pub path: String,
    /// Target project (defaults file used when absent)
    pub project: Option<String>,
    /// Target dataset (defaults file used when absent)
    pub dataset: Option<String>,
    /// Re-embed everything, bypassing digest checks
    #[serde(default)]
    pub force: bool,
}

/// Arguments for the indexGitHub tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct IndexGithubArgs {
    /// Repository URL
    #[validate(length(min = 1))]
    pub url: String,
    /// Target project (defaults file used when absent)
    pub project: Option<String>,
    /// Target dataset (defaults to `github-{branch}`)
    pub dataset: Option<String>,
    /// Branch to clone
    pub branch: Option<String>,
    /// Wait up to 120 s for completion instead of returning immediately
    #[serde(default, rename = "waitForCompletion")]
    pub wait_for_completion: bool,
}

/// Arguments for the crawl tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct CrawlArgs {
    /// Seed URL
    #[validate(length(min = 1))]
    pub url: String,
    /// Crawl mode: single, batch, recursive or sitemap
    #[serde(default = "CrawlArgs::default_mode")]
    pub mode: String,
    /// Target project (defaults file used when absent)
    pub project: Option<String>,
    /// Target dataset (defaults file used when absent)
    pub dataset: Option<String>,
    /// Maximum recursion depth
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Hard page cap
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Restrict harvested links to the seed domain
    #[serde(default = "default_true")]
    pub same_domain_only: bool,
}

impl CrawlArgs {
    fn default_mode() -> String {
        "recursive".to_string()
    }
}

/// Arguments for the search / query tools
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct SearchArgs {
    /// Query text
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    /// Target project (defaults file used when absent)
    pub project: Option<String>,
    /// Dataset selector; defaults to the stored default dataset
    pub dataset: Option<SelectorArg>,
    /// Number of results
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum score
    #[serde(default)]
    pub threshold: f64,
    /// Restrict to a language
    pub language: Option<String>,
    /// Restrict to paths starting with this prefix
    pub path_prefix: Option<String>,
    /// Restrict to a repository
    pub repo: Option<String>,
}

/// Arguments for the smart_query tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct SmartQueryArgs {
    /// Question to answer from the indexed corpus
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    /// Target project (defaults file used when absent)
    pub project: Option<String>,
    /// Dataset selector; defaults to all datasets in the project
    pub dataset: Option<SelectorArg>,
    /// Retrieval depth for the synthesis context
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Arguments for the status tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct StatusArgs {
    /// Project to report on (defaults file used when absent)
    pub project: Option<String>,
    /// Restrict to one dataset
    pub dataset: Option<String>,
    /// Restrict to one operation id
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Only include non-terminal operations
    #[serde(default)]
    pub active: bool,
}

/// Arguments for the clear tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct ClearArgs {
    /// Project to clear (defaults file used when absent)
    pub project: Option<String>,
    /// Dataset selector; all datasets when absent
    pub dataset: Option<SelectorArg>,
    /// Report what would be deleted without mutating anything
    #[serde(default, rename = "dryRun")]
    pub dry_run: bool,
}

/// Arguments for listDatasets / listScopes
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct ListDatasetsArgs {
    /// Project to list (defaults file used when absent)
    pub project: Option<String>,
}

/// Arguments for getDatasetStats
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct DatasetStatsArgs {
    /// Project owning the dataset (defaults file used when absent)
    pub project: Option<String>,
    /// Dataset to report on
    #[validate(length(min = 1))]
    pub dataset: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_arg_accepts_string_and_list() {
        let one: SelectorArg = serde_json::from_str("\"github-*\"").unwrap();
        assert!(matches!(
            one.to_selector(),
            ccx_domain::scope::DatasetSelector::Glob(_)
        ));

        let many: SelectorArg = serde_json::from_str("[\"docs\", \"github-main\"]").unwrap();
        assert!(matches!(
            many.to_selector(),
            ccx_domain::scope::DatasetSelector::Many(_)
        ));
    }

    #[test]
    fn search_args_defaults() {
        let args: SearchArgs = serde_json::from_str("{\"query\": \"auth\"}").unwrap();
        assert_eq!(args.top_k, 10);
        assert!(args.threshold.abs() < f64::EPSILON);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn empty_query_fails_validation() {
        let args: SearchArgs = serde_json::from_str("{\"query\": \"\"}").unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn crawl_args_defaults() {
        let args: CrawlArgs =
            serde_json::from_str("{\"url\": \"https://docs.example.com\"}").unwrap();
        assert_eq!(args.mode, "recursive");
        assert_eq!(args.max_depth, 2);
        assert_eq!(args.max_pages, 50);
        assert!(args.same_domain_only);
    }
}
