//! MCP protocol server
//!
//! Implements the rmcp `ServerHandler` over the shared application context.
//! All dependencies arrive through constructor injection.

use std::sync::Arc;

use rmcp::model::{
    CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;

use crate::handlers::{
    ClearHandler, CrawlHandler, DatasetStatsHandler, IndexGithubHandler, IndexHandler,
    InitHandler, ListDatasetsHandler, ListScopesHandler, SearchHandler, SmartQueryHandler,
    StatusHandler,
};
use crate::state::AppContext;
use crate::tools::{create_tool_list, route_tool_call, ToolHandlers};

/// MCP server exposing the `claudeContext.*` tool surface
#[derive(Clone)]
pub struct CcxMcpServer {
    handlers: Arc<ToolHandlers>,
}

impl CcxMcpServer {
    /// Create the server over a shared context
    pub fn new(context: Arc<AppContext>) -> Self {
        let handlers = ToolHandlers {
            init: Arc::new(InitHandler::new(context.clone())),
            index: Arc::new(IndexHandler::new(context.clone())),
            index_github: Arc::new(IndexGithubHandler::new(context.clone())),
            crawl: Arc::new(CrawlHandler::new(context.clone())),
            search: Arc::new(SearchHandler::new(context.clone())),
            smart_query: Arc::new(SmartQueryHandler::new(context.clone())),
            status: Arc::new(StatusHandler::new(context.clone())),
            clear: Arc::new(ClearHandler::new(context.clone())),
            list_datasets: Arc::new(ListDatasetsHandler::new(context.clone())),
            list_scopes: Arc::new(ListScopesHandler::new(context.clone())),
            dataset_stats: Arc::new(DatasetStatsHandler::new(context)),
        };
        Self {
            handlers: Arc::new(handlers),
        }
    }
}

impl ServerHandler for CcxMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "claude-context".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "claude-context - hybrid code and web content retrieval\n\n\
                 Index local repositories, remote repositories and crawled\n\
                 documentation into project/dataset scopes, then query them\n\
                 with hybrid semantic search.\n\n\
                 Start with claudeContext.init to set a default scope, then\n\
                 claudeContext.index or claudeContext.crawl to ingest and\n\
                 claudeContext.search to retrieve.\n"
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _pagination: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = create_tool_list()?;
        Ok(ListToolsResult {
            tools,
            meta: Default::default(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        route_tool_call(request, &self.handlers).await
    }
}
