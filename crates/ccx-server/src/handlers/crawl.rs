//! crawl tool handler

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use validator::Validate;

use ccx_application::{CrawlMode, CrawlRequest, CrawlStrategy};

use crate::args::CrawlArgs;
use crate::formatter;
use crate::state::AppContext;

/// Starts crawl jobs
pub struct CrawlHandler {
    context: Arc<AppContext>,
}

impl CrawlHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the crawl tool request: start the job, return its progress id
    pub async fn handle(
        &self,
        Parameters(args): Parameters<CrawlArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let mode = match CrawlMode::parse(&args.mode) {
            Ok(mode) => mode,
            Err(e) => return Err(McpError::invalid_params(e.to_string(), None)),
        };
        let scope = match self
            .context
            .resolve_scope(args.project.as_deref(), args.dataset.as_deref())
        {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        let request = CrawlRequest {
            scope: scope.clone(),
            seeds: vec![args.url.clone()],
            mode,
            max_depth: args.max_depth,
            max_pages: args.max_pages,
            same_domain_only: args.same_domain_only,
        };

        let operation_id = CrawlStrategy::make_operation_id();
        let context = Arc::clone(&self.context);
        let id_for_task = operation_id.clone();
        tokio::spawn(async move {
            if let Err(e) = context
                .crawl
                .crawl_tracked(&request, &context.cancel, &id_for_task)
                .await
            {
                tracing::error!(error = %e, "crawl failed");
            }
        });

        Ok(formatter::success(
            format!(
                "Crawl of {} ({}) into {scope} started; progress id '{operation_id}'.",
                args.url, args.mode
            ),
            serde_json::json!({
                "progress_id": operation_id,
                "project": scope.project,
                "dataset": scope.dataset,
            }),
        ))
    }
}
