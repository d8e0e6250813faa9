//! Tool dispatch
//!
//! Routes incoming tool calls to the matching handler.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::ErrorData as McpError;
use std::sync::Arc;

use crate::args::{
    ClearArgs, CrawlArgs, DatasetStatsArgs, IndexArgs, IndexGithubArgs, InitArgs,
    ListDatasetsArgs, SearchArgs, SmartQueryArgs, StatusArgs,
};
use crate::handlers::{
    ClearHandler, CrawlHandler, DatasetStatsHandler, IndexGithubHandler, IndexHandler,
    InitHandler, ListDatasetsHandler, ListScopesHandler, SearchHandler, SmartQueryHandler,
    StatusHandler,
};
use crate::tools::registry::names;

/// Handler references for tool routing
pub struct ToolHandlers {
    /// init
    pub init: Arc<InitHandler>,
    /// index
    pub index: Arc<IndexHandler>,
    /// indexGitHub
    pub index_github: Arc<IndexGithubHandler>,
    /// crawl
    pub crawl: Arc<CrawlHandler>,
    /// search / query
    pub search: Arc<SearchHandler>,
    /// smart_query
    pub smart_query: Arc<SmartQueryHandler>,
    /// status
    pub status: Arc<StatusHandler>,
    /// clear
    pub clear: Arc<ClearHandler>,
    /// listDatasets
    pub list_datasets: Arc<ListDatasetsHandler>,
    /// listScopes
    pub list_scopes: Arc<ListScopesHandler>,
    /// getDatasetStats
    pub dataset_stats: Arc<DatasetStatsHandler>,
}

/// Route a tool call to the appropriate handler
pub async fn route_tool_call(
    request: CallToolRequestParam,
    handlers: &ToolHandlers,
) -> Result<CallToolResult, McpError> {
    match request.name.as_ref() {
        names::INIT => {
            let args = parse_args::<InitArgs>(&request)?;
            handlers.init.handle(Parameters(args)).await
        }
        names::INDEX => {
            let args = parse_args::<IndexArgs>(&request)?;
            handlers.index.handle(Parameters(args)).await
        }
        names::INDEX_GITHUB => {
            let args = parse_args::<IndexGithubArgs>(&request)?;
            handlers.index_github.handle(Parameters(args)).await
        }
        names::CRAWL => {
            let args = parse_args::<CrawlArgs>(&request)?;
            handlers.crawl.handle(Parameters(args)).await
        }
        names::SEARCH | names::QUERY => {
            let args = parse_args::<SearchArgs>(&request)?;
            handlers.search.handle(Parameters(args)).await
        }
        names::SMART_QUERY => {
            let args = parse_args::<SmartQueryArgs>(&request)?;
            handlers.smart_query.handle(Parameters(args)).await
        }
        names::STATUS => {
            let args = parse_args::<StatusArgs>(&request)?;
            handlers.status.handle(Parameters(args)).await
        }
        names::CLEAR => {
            let args = parse_args::<ClearArgs>(&request)?;
            handlers.clear.handle(Parameters(args)).await
        }
        names::LIST_DATASETS => {
            let args = parse_args::<ListDatasetsArgs>(&request)?;
            handlers.list_datasets.handle(Parameters(args)).await
        }
        names::LIST_SCOPES => {
            let args = parse_args::<ListDatasetsArgs>(&request)?;
            handlers.list_scopes.handle(Parameters(args)).await
        }
        names::DATASET_STATS => {
            let args = parse_args::<DatasetStatsArgs>(&request)?;
            handlers.dataset_stats.handle(Parameters(args)).await
        }
        _ => Err(McpError::invalid_params(
            format!("Unknown tool: {}", request.name),
            None,
        )),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    request: &CallToolRequestParam,
) -> Result<T, McpError> {
    let args_value = serde_json::Value::Object(request.arguments.clone().unwrap_or_default());
    serde_json::from_value(args_value)
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {e}"), None))
}
