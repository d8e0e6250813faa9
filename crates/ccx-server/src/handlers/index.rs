//! index and indexGitHub tool handlers

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use ccx_domain::constants::GITHUB_WAIT_SECS;

use crate::args::{IndexArgs, IndexGithubArgs};
use crate::formatter;
use crate::state::AppContext;

/// Starts local-path ingest runs
pub struct IndexHandler {
    context: Arc<AppContext>,
}

impl IndexHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the index tool request: kick off the run and return the
    /// progress key immediately; the work proceeds asynchronously.
    pub async fn handle(
        &self,
        Parameters(args): Parameters<IndexArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let path = Path::new(&args.path);
        if !path.is_dir() {
            return Ok(formatter::failure(format!(
                "path {} does not exist or is not a directory",
                path.display()
            )));
        }

        let scope = match self
            .context
            .resolve_scope(args.project.as_deref(), args.dataset.as_deref())
        {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        let key = self
            .context
            .spawn_index_local(scope.clone(), path.to_path_buf(), args.force);

        Ok(formatter::success(
            format!(
                "Indexing {} into {scope} started; poll status with operation '{key}'.",
                path.display()
            ),
            serde_json::json!({
                "operation_id": key,
                "project": scope.project,
                "dataset": scope.dataset,
            }),
        ))
    }
}

/// Enqueues remote-repository ingest jobs
pub struct IndexGithubHandler {
    context: Arc<AppContext>,
}

impl IndexGithubHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the indexGitHub tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<IndexGithubArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let branch = args.branch.clone();
        let dataset = args
            .dataset
            .clone()
            .unwrap_or_else(|| format!("github-{}", branch.as_deref().unwrap_or("main")));
        let scope = match self
            .context
            .resolve_scope(args.project.as_deref(), Some(&dataset))
        {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };
        let key = scope.progress_key();

        if args.wait_for_completion {
            // Spawn before waiting: a timeout must only stop the wait, not
            // cancel the clone/index in flight.
            let context = Arc::clone(&self.context);
            let url = args.url.clone();
            let scope_for_task = scope.clone();
            let branch_for_task = branch.clone();
            let handle = tokio::spawn(async move {
                context
                    .index_github(scope_for_task, &url, branch_for_task.as_deref())
                    .await
            });

            match tokio::time::timeout(Duration::from_secs(GITHUB_WAIT_SECS), handle).await {
                Ok(Ok(Ok(outcome))) => Ok(formatter::success(
                    format!(
                        "Indexed {} into {scope}: {} chunks stored.",
                        args.url, outcome.chunks_stored
                    ),
                    serde_json::json!({
                        "operation_id": key,
                        "chunks_stored": outcome.chunks_stored,
                        "point_count": outcome.point_count,
                        "collection": outcome.collection_name,
                    }),
                )),
                Ok(Ok(Err(e))) => Ok(formatter::failure(e.to_string())),
                Ok(Err(e)) => Ok(formatter::failure(format!("github ingest task failed: {e}"))),
                Err(_) => Ok(formatter::success(
                    format!(
                        "Ingest of {} is still running after {GITHUB_WAIT_SECS} s; poll operation '{key}'.",
                        args.url
                    ),
                    serde_json::json!({ "operation_id": key, "completed": false }),
                )),
            }
        } else {
            let context = Arc::clone(&self.context);
            let url = args.url.clone();
            let scope_for_task = scope.clone();
            tokio::spawn(async move {
                if let Err(e) = context
                    .index_github(scope_for_task, &url, branch.as_deref())
                    .await
                {
                    tracing::error!(error = %e, "github ingest failed");
                }
            });
            Ok(formatter::success(
                format!("Ingest of {} into {scope} enqueued.", args.url),
                serde_json::json!({ "operation_id": key }),
            ))
        }
    }
}
