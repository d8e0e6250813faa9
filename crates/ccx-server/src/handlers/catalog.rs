//! listDatasets, listScopes and getDatasetStats tool handlers

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use validator::Validate;

use ccx_domain::scope::collection_name;

use crate::args::{DatasetStatsArgs, ListDatasetsArgs};
use crate::formatter;
use crate::state::AppContext;

/// Lists datasets with their collection bindings
pub struct ListDatasetsHandler {
    context: Arc<AppContext>,
}

impl ListDatasetsHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the listDatasets tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<ListDatasetsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let scope = match self.context.resolve_scope(args.project.as_deref(), None) {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        let summaries = self
            .context
            .catalog
            .list_datasets(&scope.project)
            .await
            .map_err(|e| McpError::internal_error(format!("listing failed: {e}"), None))?;

        let mut human = format!(
            "{} dataset(s) in project '{}':\n",
            summaries.len(),
            scope.project
        );
        for summary in &summaries {
            human.push_str(&format!(
                "  {} ({} points{})\n",
                summary.name,
                summary.point_count,
                summary
                    .collection_name
                    .as_deref()
                    .map(|c| format!(", collection {c}"))
                    .unwrap_or_else(|| ", not indexed".to_string()),
            ));
        }
        let payload = serde_json::json!({ "datasets": summaries });
        Ok(formatter::success(human, payload))
    }
}

/// Lists (project, dataset, collection) scopes
pub struct ListScopesHandler {
    context: Arc<AppContext>,
}

impl ListScopesHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the listScopes tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<ListDatasetsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let scope = match self.context.resolve_scope(args.project.as_deref(), None) {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        let summaries = self
            .context
            .catalog
            .list_datasets(&scope.project)
            .await
            .map_err(|e| McpError::internal_error(format!("listing failed: {e}"), None))?;

        let scopes: Vec<serde_json::Value> = summaries
            .iter()
            .map(|summary| {
                serde_json::json!({
                    "project": scope.project,
                    "dataset": summary.name,
                    "collection": summary
                        .collection_name
                        .clone()
                        .unwrap_or_else(|| collection_name(&scope.project, &summary.name)),
                    "indexed": summary.collection_name.is_some(),
                })
            })
            .collect();

        let human = format!(
            "{} scope(s) under project '{}'.",
            scopes.len(),
            scope.project
        );
        Ok(formatter::success(human, serde_json::json!({ "scopes": scopes })))
    }
}

/// Reports aggregate statistics for one dataset
pub struct DatasetStatsHandler {
    context: Arc<AppContext>,
}

impl DatasetStatsHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the getDatasetStats tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<DatasetStatsArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let scope = match self.context.resolve_scope(args.project.as_deref(), None) {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        match self
            .context
            .catalog
            .dataset_stats(&scope.project, &args.dataset)
            .await
            .map_err(|e| McpError::internal_error(format!("stats failed: {e}"), None))?
        {
            Some(stats) => Ok(formatter::success(
                format!(
                    "Dataset '{}': {} chunks across {} files, {} points.",
                    args.dataset, stats.chunk_count, stats.file_count, stats.point_count
                ),
                serde_json::json!({
                    "dataset": args.dataset,
                    "chunk_count": stats.chunk_count,
                    "file_count": stats.file_count,
                    "point_count": stats.point_count,
                    "last_indexed_at": stats.last_indexed_at,
                }),
            )),
            None => Ok(formatter::failure(format!(
                "dataset '{}' not found in project '{}'",
                args.dataset, scope.project
            ))),
        }
    }
}
