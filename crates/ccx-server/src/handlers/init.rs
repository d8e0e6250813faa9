//! init tool handler

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use validator::Validate;

use crate::args::InitArgs;
use crate::formatter;
use crate::state::AppContext;

/// Persists default scope for subsequent tool calls
pub struct InitHandler {
    context: Arc<AppContext>,
}

impl InitHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the init tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<InitArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        match self.context.init_defaults(
            args.project.as_deref(),
            args.path.as_deref(),
            args.dataset.as_deref(),
        ) {
            Ok(defaults) => Ok(formatter::success(
                format!(
                    "Defaults saved: project '{}', dataset '{}'.",
                    defaults.project, defaults.dataset
                ),
                serde_json::json!({
                    "project": defaults.project,
                    "dataset": defaults.dataset,
                }),
            )),
            Err(e) => Ok(formatter::failure(e.to_string())),
        }
    }
}
