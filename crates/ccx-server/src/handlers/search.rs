//! search / query and smart_query tool handlers

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use std::sync::Arc;
use validator::Validate;

use ccx_domain::scope::DatasetSelector;
use ccx_domain::value_objects::{QueryFilters, QueryRequest};

use crate::args::{SearchArgs, SmartQueryArgs};
use crate::formatter;
use crate::state::AppContext;

fn build_query(
    context: &AppContext,
    project: Option<&str>,
    dataset: Option<&crate::args::SelectorArg>,
    query: &str,
    top_k: usize,
    threshold: f64,
    filters: QueryFilters,
) -> Result<QueryRequest, ccx_domain::Error> {
    let scope = context.resolve_scope(project, None)?;
    let selector = match dataset {
        Some(arg) => arg.to_selector(),
        None => DatasetSelector::One(scope.dataset.clone()),
    };
    Ok(QueryRequest {
        project: scope.project,
        dataset_selector: selector,
        query_text: query.trim().to_string(),
        top_k,
        threshold,
        filters,
    })
}

/// Runs hybrid queries
pub struct SearchHandler {
    context: Arc<AppContext>,
}

impl SearchHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the search / query tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let request = build_query(
            &self.context,
            args.project.as_deref(),
            args.dataset.as_ref(),
            &args.query,
            args.top_k,
            args.threshold,
            QueryFilters {
                language: args.language.clone(),
                path_prefix: args.path_prefix.clone(),
                repo: args.repo.clone(),
            },
        )
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let response = self
            .context
            .retrieval
            .search(&request)
            .await
            .map_err(|e| McpError::internal_error(format!("Search failed: {e}"), None))?;

        let human = formatter::render_search(&args.query, &response);
        let payload = serde_json::json!({
            "results": response.hits,
            "datasets_searched": response.datasets_searched,
        });
        Ok(formatter::success(human, payload))
    }
}

/// Retrieval plus LLM synthesis
pub struct SmartQueryHandler {
    context: Arc<AppContext>,
}

impl SmartQueryHandler {
    /// Create the handler
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Handle the smart_query tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<SmartQueryArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(format!("Invalid arguments: {e}"), None));
        }

        let Some(smart) = &self.context.smart_query else {
            return Ok(formatter::failure(
                "smart_query is disabled: no LLM API key configured".to_string(),
            ));
        };

        let request = build_query(
            &self.context,
            args.project.as_deref(),
            args.dataset.as_ref(),
            &args.query,
            args.top_k,
            0.0,
            QueryFilters::default(),
        )
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        match smart.answer(&request).await {
            Ok(answer) if answer.hits.is_empty() => Ok(formatter::success(
                "No indexed content matched the question.".to_string(),
                serde_json::json!({ "answer": null, "citations": [] }),
            )),
            Ok(answer) => {
                let mut human = answer.answer.clone();
                if !answer.citations.is_empty() {
                    human.push_str("\n\nSources:\n");
                    for citation in &answer.citations {
                        human.push_str(&format!(
                            "  [{}] {}\n",
                            citation.index, citation.source_path
                        ));
                    }
                }
                let payload = serde_json::to_value(&answer)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(formatter::success(human, payload))
            }
            Err(e) => Ok(formatter::failure(e.to_string())),
        }
    }
}
