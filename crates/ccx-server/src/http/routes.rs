//! HTTP route definitions
//!
//! Routes:
//! - `POST /projects/{project}/ingest/local` - ingest a local directory
//! - `POST /projects/{project}/ingest/github` - ingest a remote repository
//! - `POST /projects/{project}/crawl` - start a crawl job
//! - `GET  /projects/{project}/progress` - progress snapshots
//!   (`?active=true`, `?operationId=...`; project `all` spans every project)
//! - `GET  /health` - dependency health

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use super::handlers::{crawl, health, ingest_github, ingest_local, progress};
use crate::state::AppContext;

/// Build the HTTP router over the shared context
pub fn http_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/projects/{project}/ingest/local", post(ingest_local))
        .route("/projects/{project}/ingest/github", post(ingest_github))
        .route("/projects/{project}/crawl", post(crawl))
        .route("/projects/{project}/progress", get(progress))
        .route("/health", get(health))
        .with_state(context)
}
