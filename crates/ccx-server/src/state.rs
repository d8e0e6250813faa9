//! Shared application context
//!
//! One explicitly-constructed bundle of services handed to the MCP tool
//! layer and the HTTP surface. Also owns scope resolution against the
//! user-level defaults file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ccx_application::{
    CatalogService, CrawlStrategy, EmbeddingGateway, IndexMode, IndexOutcome, IndexSource,
    IndexingCoordinator, RetrievalPipeline, SmartQueryService,
};
use ccx_domain::ports::{CollectionRegistry, MetadataStore, ProgressSink, VectorStoreProvider};
use ccx_domain::scope::{auto_scope, Scope};
use ccx_domain::{Error, Result};
use ccx_infrastructure::config::AppConfig;
use ccx_infrastructure::defaults::{load_defaults_from, save_defaults_to, ScopeDefaults};
use ccx_infrastructure::ProgressTracker;

/// Service bundle shared by every surface
pub struct AppContext {
    /// Loaded configuration
    pub config: AppConfig,
    /// Relational store
    pub metadata: Arc<dyn MetadataStore>,
    /// Collection registry
    pub registry: Arc<dyn CollectionRegistry>,
    /// Vector store
    pub vectors: Arc<dyn VectorStoreProvider>,
    /// Embedding gateway
    pub gateway: Arc<EmbeddingGateway>,
    /// Indexing coordinator
    pub indexer: Arc<IndexingCoordinator>,
    /// Retrieval pipeline
    pub retrieval: Arc<RetrievalPipeline>,
    /// Crawl strategy
    pub crawl: Arc<CrawlStrategy>,
    /// Catalog operations
    pub catalog: Arc<CatalogService>,
    /// Smart query, present when an LLM key is configured
    pub smart_query: Option<Arc<SmartQueryService>>,
    /// Progress fabric
    pub progress: Arc<ProgressTracker>,
    /// Process-wide cancellation root
    pub cancel: CancellationToken,
    /// Location of the defaults file
    pub defaults_path: PathBuf,
}

impl AppContext {
    /// Resolve the effective scope from explicit arguments and the defaults
    /// file. An explicit path elsewhere always wins over a stored project.
    pub fn resolve_scope(&self, project: Option<&str>, dataset: Option<&str>) -> Result<Scope> {
        let stored = load_defaults_from(&self.defaults_path)?;
        let project = project
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|d| d.project.clone()))
            .ok_or_else(|| {
                Error::invalid_argument(
                    "no project given and no defaults stored; run init first",
                )
            })?;
        let dataset = dataset
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|d| d.dataset.clone()))
            .unwrap_or_else(|| ccx_domain::constants::DEFAULT_DATASET.to_string());
        Ok(Scope::new(project, dataset))
    }

    /// Persist defaults, auto-scoping from a path when one is given.
    /// A path always overrides a conflicting explicit project.
    pub fn init_defaults(
        &self,
        project: Option<&str>,
        path: Option<&str>,
        dataset: Option<&str>,
    ) -> Result<ScopeDefaults> {
        let scope = match path {
            Some(path) => {
                let derived = auto_scope(Path::new(path));
                Scope::new(
                    derived.project,
                    dataset.unwrap_or(&derived.dataset).to_string(),
                )
            }
            None => {
                let project = project.ok_or_else(|| {
                    Error::invalid_argument("init requires a project and/or a path")
                })?;
                Scope::new(
                    project.to_string(),
                    dataset
                        .unwrap_or(ccx_domain::constants::DEFAULT_DATASET)
                        .to_string(),
                )
            }
        };

        let defaults = ScopeDefaults {
            project: scope.project,
            dataset: scope.dataset,
        };
        save_defaults_to(&self.defaults_path, &defaults)?;
        info!(project = %defaults.project, dataset = %defaults.dataset, "defaults saved");
        Ok(defaults)
    }

    /// Run a local-path index to completion
    pub async fn index_local(
        &self,
        scope: Scope,
        path: PathBuf,
        force: bool,
        repo: Option<String>,
        extra_tags: HashMap<String, String>,
    ) -> Result<IndexOutcome> {
        let mut tags = extra_tags;
        tags.entry("src".to_string()).or_insert_with(|| "code".to_string());

        self.indexer
            .index(
                ccx_application::indexing::IndexJob {
                    scope,
                    source: IndexSource::LocalPath { root: path, repo },
                    mode: if force {
                        IndexMode::Forced
                    } else {
                        IndexMode::Incremental
                    },
                    tags,
                },
                &self.cancel,
            )
            .await
    }

    /// Spawn a local-path index in the background, returning the progress key
    pub fn spawn_index_local(
        self: &Arc<Self>,
        scope: Scope,
        path: PathBuf,
        force: bool,
    ) -> String {
        let key = scope.progress_key();
        let context = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = context
                .index_local(scope, path, force, None, HashMap::new())
                .await
            {
                error!(error = %e, "background index failed");
            }
        });
        key
    }

    /// Clone a GitHub repository shallowly and index it
    pub async fn index_github(
        &self,
        scope: Scope,
        url: &str,
        branch: Option<&str>,
    ) -> Result<IndexOutcome> {
        let checkout = tempfile_dir()?;
        let mut command = tokio::process::Command::new("git");
        command.arg("clone").arg("--depth").arg("1");
        if let Some(branch) = branch {
            command.arg("--branch").arg(branch);
        }
        command.arg(url).arg(checkout.path());

        let output = command
            .output()
            .await
            .map_err(|e| Error::io(format!("failed to run git: {e}")))?;
        if !output.status.success() {
            return Err(Error::io(format!(
                "git clone of {url} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut tags = HashMap::new();
        tags.insert(
            "branch".to_string(),
            branch.unwrap_or("main").to_string(),
        );
        let outcome = self
            .index_local(
                scope,
                checkout.path().to_path_buf(),
                false,
                Some(url.to_string()),
                tags,
            )
            .await;
        drop(checkout);
        outcome
    }

    /// Progress snapshot helper for tools and HTTP
    pub fn progress_snapshot(
        &self,
        project: &str,
        operation_id: Option<&str>,
        active_only: bool,
    ) -> Vec<ccx_domain::value_objects::ProgressRecord> {
        match operation_id {
            Some(operation_id) => self
                .progress
                .snapshot(operation_id)
                .into_iter()
                .collect(),
            None if project == "all" => self.progress.snapshot_all(active_only),
            None => self.progress.snapshot_project(project, active_only),
        }
    }
}

fn tempfile_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("ccx-github-")
        .tempdir()
        .map_err(|e| Error::io(format!("failed to create checkout directory: {e}")))
}
