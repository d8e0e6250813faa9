//! status tool handler

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use ccx_domain::constants::STATUS_DEADLINE_SECS;
use ccx_domain::ports::CollectionRegistry;

use crate::args::StatusArgs;
use crate::formatter;
use crate::state::AppContext;

/// Reports progress snapshots and collection bindings
pub struct StatusHandler {
    context: Arc<AppContext>,
}

impl StatusHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the status tool request
    ///
    /// The in-memory snapshot is instant; the registry listing runs under a
    /// 10-second deadline so a stalled store cannot hang the caller.
    pub async fn handle(
        &self,
        Parameters(args): Parameters<StatusArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let scope = match self
            .context
            .resolve_scope(args.project.as_deref(), args.dataset.as_deref())
        {
            Ok(scope) => scope,
            Err(e) => return Ok(formatter::failure(e.to_string())),
        };

        let mut records = self.context.progress_snapshot(
            &scope.project,
            args.operation_id.as_deref(),
            args.active,
        );
        if let Some(dataset) = &args.dataset {
            records.retain(|record| &record.dataset == dataset);
        }

        let listings = match tokio::time::timeout(
            Duration::from_secs(STATUS_DEADLINE_SECS),
            self.context.registry.list_for_project(&scope.project),
        )
        .await
        {
            Ok(Ok(listings)) => listings,
            Ok(Err(e)) => {
                return Ok(formatter::failure(format!("registry read failed: {e}")));
            }
            Err(_) => {
                return Ok(formatter::failure(format!(
                    "database unreachable: registry did not answer within {STATUS_DEADLINE_SECS} s"
                )));
            }
        };

        let mut human = format!("Project '{}':\n", scope.project);
        if records.is_empty() {
            human.push_str("  no tracked operations\n");
        }
        for record in &records {
            human.push_str(&format!(
                "  {} [{}] {}/{} ({})\n",
                record.operation_id,
                record.phase,
                record.stored,
                record.expected,
                serde_json::to_string(&record.status).unwrap_or_default(),
            ));
        }
        for listing in &listings {
            human.push_str(&format!(
                "  dataset '{}' -> {} ({} points)\n",
                listing.dataset_name, listing.collection_name, listing.point_count
            ));
        }

        let payload = serde_json::json!({
            "operations": records,
            "collections": listings
                .iter()
                .map(|l| {
                    serde_json::json!({
                        "dataset": l.dataset_name,
                        "collection": l.collection_name,
                        "point_count": l.point_count,
                        "last_indexed_at": l.last_indexed_at,
                    })
                })
                .collect::<Vec<_>>(),
        });
        Ok(formatter::success(human, payload))
    }
}
