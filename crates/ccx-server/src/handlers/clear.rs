//! clear tool handler

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use validator::Validate;

use crate::args::ClearArgs;
use crate::formatter;
use crate::state::AppContext;

/// Deletes vectors, chunks and registry entries for a scope
pub struct ClearHandler {
    context: Arc<AppContext>,
}

impl ClearHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the clear tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<ClearArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let scope = match self.context.resolve_scope(args.project.as_deref(), None) {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };
        let selector = args.dataset.as_ref().map(|arg| arg.to_selector());

        match self
            .context
            .catalog
            .clear(&scope.project, selector.as_ref(), args.dry_run)
            .await
        {
            Ok(report) => {
                let verb = if args.dry_run { "Would remove" } else { "Removed" };
                Ok(formatter::success(
                    format!(
                        "{verb} {} dataset(s), {} chunk(s), {} point(s), {} collection record(s) from project '{}'.",
                        report.datasets, report.chunks, report.points, report.collections, scope.project
                    ),
                    serde_json::json!({
                        "dry_run": args.dry_run,
                        "datasets": report.datasets,
                        "chunks": report.chunks,
                        "points": report.points,
                        "collections": report.collections,
                    }),
                ))
            }
            Err(e) => Ok(formatter::failure(e.to_string())),
        }
    }
}
