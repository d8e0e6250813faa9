//! HTTP request handlers
//!
//! JSON in, JSON out. Long-running endpoints accept `waitForCompletion`;
//! without it they return an `operation_id` to poll via the progress
//! endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ccx_application::{CrawlMode, CrawlRequest, CrawlStrategy};
use ccx_domain::ports::VectorStoreProvider;
use ccx_domain::scope::Scope;

use crate::state::AppContext;

/// JSON error envelope
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ccx_domain::Error> for ApiError {
    fn from(error: ccx_domain::Error) -> Self {
        match &error {
            ccx_domain::Error::InvalidArgument { .. } | ccx_domain::Error::NotFound { .. } => {
                Self::bad_request(error.to_string())
            }
            _ => Self::internal(error.to_string()),
        }
    }
}

/// Body for `POST /projects/{project}/ingest/local`
#[derive(Debug, Deserialize)]
pub struct IngestLocalBody {
    /// Directory to ingest
    pub path: String,
    /// Target dataset
    #[serde(default)]
    pub dataset: Option<String>,
    /// Repository identifier carried into payloads
    #[serde(default)]
    pub repo: Option<String>,
    /// Re-embed everything
    #[serde(default)]
    pub force: bool,
    /// Block until the run finishes
    #[serde(default, rename = "waitForCompletion")]
    pub wait_for_completion: bool,
}

/// Ingest a local directory
pub async fn ingest_local(
    State(context): State<Arc<AppContext>>,
    Path(project): Path<String>,
    Json(body): Json<IngestLocalBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dataset = body
        .dataset
        .unwrap_or_else(|| ccx_domain::constants::DEFAULT_DATASET.to_string());
    let scope = Scope::new(project, dataset);
    let key = scope.progress_key();
    let path = PathBuf::from(&body.path);
    if !path.is_dir() {
        return Err(ApiError::bad_request(format!(
            "path {} does not exist or is not a directory",
            path.display()
        )));
    }

    if body.wait_for_completion {
        let outcome = context
            .index_local(scope, path, body.force, body.repo, HashMap::new())
            .await?;
        Ok(Json(json!({
            "operation_id": key,
            "status": "completed",
            "chunks_stored": outcome.chunks_stored,
            "point_count": outcome.point_count,
            "collection": outcome.collection_name,
        })))
    } else {
        let key = context.spawn_index_local(scope, path, body.force);
        Ok(Json(json!({ "operation_id": key, "status": "started" })))
    }
}

/// Body for `POST /projects/{project}/ingest/github`
#[derive(Debug, Deserialize)]
pub struct IngestGithubBody {
    /// Repository URL
    pub url: String,
    /// Branch to clone
    #[serde(default)]
    pub branch: Option<String>,
    /// Target dataset (defaults to `github-{branch}`)
    #[serde(default)]
    pub dataset: Option<String>,
    /// Block until the run finishes
    #[serde(default, rename = "waitForCompletion")]
    pub wait_for_completion: bool,
}

/// Ingest a remote repository
pub async fn ingest_github(
    State(context): State<Arc<AppContext>>,
    Path(project): Path<String>,
    Json(body): Json<IngestGithubBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let dataset = body
        .dataset
        .clone()
        .unwrap_or_else(|| format!("github-{}", body.branch.as_deref().unwrap_or("main")));
    let scope = Scope::new(project, dataset);
    let key = scope.progress_key();

    if body.wait_for_completion {
        let outcome = context
            .index_github(scope, &body.url, body.branch.as_deref())
            .await?;
        Ok(Json(json!({
            "operation_id": key,
            "status": "completed",
            "chunks_stored": outcome.chunks_stored,
            "point_count": outcome.point_count,
        })))
    } else {
        let url = body.url.clone();
        let branch = body.branch.clone();
        let context = Arc::clone(&context);
        tokio::spawn(async move {
            if let Err(e) = context.index_github(scope, &url, branch.as_deref()).await {
                tracing::error!(error = %e, "github ingest failed");
            }
        });
        Ok(Json(json!({ "operation_id": key, "status": "started" })))
    }
}

/// Body for `POST /projects/{project}/crawl`
#[derive(Debug, Deserialize)]
pub struct CrawlBody {
    /// Seed URLs (`url` also accepted for a single seed)
    #[serde(default)]
    pub urls: Vec<String>,
    /// Single seed URL
    #[serde(default)]
    pub url: Option<String>,
    /// Crawl mode
    #[serde(default = "CrawlBody::default_mode")]
    pub mode: String,
    /// Target dataset
    #[serde(default)]
    pub dataset: Option<String>,
    /// Maximum recursion depth
    #[serde(default = "CrawlBody::default_depth", rename = "maxDepth")]
    pub max_depth: u32,
    /// Hard page cap
    #[serde(default = "CrawlBody::default_pages", rename = "maxPages")]
    pub max_pages: usize,
    /// Restrict harvested links to the seed domains
    #[serde(default = "CrawlBody::default_same_domain", rename = "sameDomainOnly")]
    pub same_domain_only: bool,
    /// Block until the crawl finishes
    #[serde(default, rename = "waitForCompletion")]
    pub wait_for_completion: bool,
}

impl CrawlBody {
    fn default_mode() -> String {
        "recursive".to_string()
    }
    fn default_depth() -> u32 {
        2
    }
    fn default_pages() -> usize {
        50
    }
    fn default_same_domain() -> bool {
        true
    }
}

/// Start a crawl job
pub async fn crawl(
    State(context): State<Arc<AppContext>>,
    Path(project): Path<String>,
    Json(body): Json<CrawlBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut seeds = body.urls.clone();
    if let Some(url) = &body.url {
        seeds.push(url.clone());
    }
    if seeds.is_empty() {
        return Err(ApiError::bad_request("crawl requires url or urls"));
    }

    let mode = CrawlMode::parse(&body.mode)?;
    let dataset = body.dataset.clone().unwrap_or_else(|| "docs".to_string());
    let request = CrawlRequest {
        scope: Scope::new(project, dataset),
        seeds,
        mode,
        max_depth: body.max_depth,
        max_pages: body.max_pages,
        same_domain_only: body.same_domain_only,
    };

    let operation_id = CrawlStrategy::make_operation_id();
    if body.wait_for_completion {
        let outcome = context
            .crawl
            .crawl_tracked(&request, &context.cancel, &operation_id)
            .await?;
        Ok(Json(json!({
            "operation_id": operation_id,
            "status": "completed",
            "pages_fetched": outcome.pages_fetched,
            "chunks_stored": outcome.chunks_stored,
        })))
    } else {
        let context = Arc::clone(&context);
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
        Ok(Json(json!({ "operation_id": operation_id, "status": "started" })))
    }
}

/// Query string for the progress endpoint
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// Only include non-terminal operations
    #[serde(default)]
    pub active: bool,
    /// Restrict to one operation id
    #[serde(default, rename = "operationId")]
    pub operation_id: Option<String>,
}

/// Progress snapshots for a project (or `all`)
pub async fn progress(
    State(context): State<Arc<AppContext>>,
    Path(project): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> Json<serde_json::Value> {
    let records =
        context.progress_snapshot(&project, query.operation_id.as_deref(), query.active);
    Json(json!({ "project": project, "operations": records }))
}

/// Aggregate dependency health
pub async fn health(State(context): State<Arc<AppContext>>) -> Json<serde_json::Value> {
    let embedding = context.gateway.health().await.is_ok();
    let vectors = context.vectors.health().await.is_ok();
    Json(json!({
        "status": if embedding && vectors { "healthy" } else { "degraded" },
        "embedding": embedding,
        "vector_store": vectors,
        "hybrid": context.gateway.hybrid_enabled(),
        "reranking": context.gateway.rerank_enabled(),
    }))
}
