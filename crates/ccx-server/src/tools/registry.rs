//! Tool registry
//!
//! Centralizes tool names, descriptions and generated input schemas for the
//! MCP tool listing. Tools live in the `claudeContext.` namespace.

use rmcp::model::Tool;
use rmcp::ErrorData as McpError;
use std::borrow::Cow;
use std::sync::Arc;

use crate::args::{
    ClearArgs, CrawlArgs, DatasetStatsArgs, IndexArgs, IndexGithubArgs, InitArgs,
    ListDatasetsArgs, SearchArgs, SmartQueryArgs, StatusArgs,
};

/// Tool name constants
pub mod names {
    /// init
    pub const INIT: &str = "claudeContext.init";
    /// index
    pub const INDEX: &str = "claudeContext.index";
    /// indexGitHub
    pub const INDEX_GITHUB: &str = "claudeContext.indexGitHub";
    /// crawl
    pub const CRAWL: &str = "claudeContext.crawl";
    /// search
    pub const SEARCH: &str = "claudeContext.search";
    /// query (alias of search)
    pub const QUERY: &str = "claudeContext.query";
    /// smart_query
    pub const SMART_QUERY: &str = "claudeContext.smart_query";
    /// status
    pub const STATUS: &str = "claudeContext.status";
    /// clear
    pub const CLEAR: &str = "claudeContext.clear";
    /// listDatasets
    pub const LIST_DATASETS: &str = "claudeContext.listDatasets";
    /// listScopes
    pub const LIST_SCOPES: &str = "claudeContext.listScopes";
    /// getDatasetStats
    pub const DATASET_STATS: &str = "claudeContext.getDatasetStats";
}

fn create_tool(
    name: &'static str,
    description: &'static str,
    schema: schemars::Schema,
) -> Result<Tool, McpError> {
    let schema_value =
        serde_json::to_value(schema).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    let input_schema = schema_value
        .as_object()
        .ok_or_else(|| McpError::internal_error(format!("schema for {name} is not an object"), None))?
        .clone();

    Ok(Tool {
        name: Cow::Borrowed(name),
        title: None,
        description: Some(Cow::Borrowed(description)),
        input_schema: Arc::new(input_schema),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: Default::default(),
    })
}

/// Create the complete list of available tools
pub fn create_tool_list() -> Result<Vec<Tool>, McpError> {
    Ok(vec![
        create_tool(
            names::INIT,
            "Persist default project and dataset; auto-scopes when only a path is given",
            schemars::schema_for!(InitArgs),
        )?,
        create_tool(
            names::INDEX,
            "Ingest a local directory into the scoped dataset; returns a progress key",
            schemars::schema_for!(IndexArgs),
        )?,
        create_tool(
            names::INDEX_GITHUB,
            "Clone and ingest a remote repository; optionally waits for completion",
            schemars::schema_for!(IndexGithubArgs),
        )?,
        create_tool(
            names::CRAWL,
            "Crawl web pages (single, batch, recursive or sitemap) into the scoped dataset",
            schemars::schema_for!(CrawlArgs),
        )?,
        create_tool(
            names::SEARCH,
            "Hybrid semantic search over one or more datasets",
            schemars::schema_for!(SearchArgs),
        )?,
        create_tool(
            names::QUERY,
            "Alias of search: hybrid semantic search over one or more datasets",
            schemars::schema_for!(SearchArgs),
        )?,
        create_tool(
            names::SMART_QUERY,
            "Retrieve context and synthesize a cited natural-language answer",
            schemars::schema_for!(SmartQueryArgs),
        )?,
        create_tool(
            names::STATUS,
            "Report indexing and crawl progress plus collection bindings",
            schemars::schema_for!(StatusArgs),
        )?,
        create_tool(
            names::CLEAR,
            "Delete vectors, chunks and registry entries for a scope (supports dryRun)",
            schemars::schema_for!(ClearArgs),
        )?,
        create_tool(
            names::LIST_DATASETS,
            "List datasets of a project with point counts",
            schemars::schema_for!(ListDatasetsArgs),
        )?,
        create_tool(
            names::LIST_SCOPES,
            "List (project, dataset, collection) scopes",
            schemars::schema_for!(ListDatasetsArgs),
        )?,
        create_tool(
            names::DATASET_STATS,
            "Aggregate statistics for one dataset",
            schemars::schema_for!(DatasetStatsArgs),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_list_is_complete_and_namespaced() {
        let tools = create_tool_list().unwrap();
        assert_eq!(tools.len(), 12);
        for tool in &tools {
            assert!(tool.name.starts_with("claudeContext."), "{}", tool.name);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn search_and_query_share_a_schema() {
        let tools = create_tool_list().unwrap();
        let search = tools.iter().find(|t| t.name == names::SEARCH).unwrap();
        let query = tools.iter().find(|t| t.name == names::QUERY).unwrap();
        assert_eq!(search.input_schema, query.input_schema);
    }
}
