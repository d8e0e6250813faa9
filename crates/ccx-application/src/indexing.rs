//! Indexing coordinator
//!
//! Orchestrates chunk -> embed -> dual-write (vector points + relational
//! chunks) -> registry update for one (project, dataset) scope. Runs are
//! serialized per scope by an exclusive async lock; distinct scopes proceed
//! in parallel. The registry is only touched after every batch succeeded, so
//! readers keep seeing the previous consistent snapshot when a run fails
//! part-way. Orphan points from a partial run are harmless: chunk ids are
//! deterministic, so a retry upserts the same ids.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ccx_domain::entities::{Chunk, CrawlPage, VectorDbKind};
use ccx_domain::ports::{
    Chunker, CollectionRegistry, MetadataStore, ProgressSink, VectorPoint, VectorStoreProvider,
};
use ccx_domain::scope::Scope;
use ccx_domain::value_objects::{ChunkPayload, FailureKind};
use ccx_domain::{Error, Result};

use crate::gateway::EmbeddingGateway;

/// File extensions considered indexable source or documentation
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "c", "h", "cpp", "hpp", "cs", "rb", "php",
    "swift", "kt", "md", "txt", "toml", "yaml", "yml", "json",
];

/// Files above this size are skipped during enumeration
const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// What to index
pub enum IndexSource {
    /// A local directory tree
    LocalPath {
        /// Root of the tree
        root: PathBuf,
        /// Repository identifier carried into point payloads
        repo: Option<String>,
    },
    /// A batch of crawled pages
    Pages(Vec<CrawlPage>),
}

/// How to treat already-indexed candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Re-embed every candidate
    Full,
    /// Skip candidates whose document digest is already stored
    Incremental,
    /// Re-embed every candidate, bypassing the digest check
    Forced,
}

/// One indexing job
pub struct IndexJob {
    /// Target scope
    pub scope: Scope,
    /// Content source
    pub source: IndexSource,
    /// Skip behavior
    pub mode: IndexMode,
    /// Tags merged into the dataset row (`src`, `branch`, ...)
    pub tags: HashMap<String, String>,
}

/// Result of a successful indexing run
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    /// Chunks written by this run
    pub chunks_stored: u64,
    /// Documents processed
    pub files_indexed: u64,
    /// Documents skipped (digest match, unreadable, oversized)
    pub files_skipped: u64,
    /// Collection bound to the dataset
    pub collection_name: String,
    /// Total points in the collection for this dataset after the run
    pub point_count: u64,
}

/// One enumerated document awaiting chunking
struct Candidate {
    source_path: String,
    content: String,
}

/// Coordinates indexing runs across scopes
pub struct IndexingCoordinator {
    metadata: Arc<dyn MetadataStore>,
    registry: Arc<dyn CollectionRegistry>,
    vectors: Arc<dyn VectorStoreProvider>,
    gateway: Arc<EmbeddingGateway>,
    chunker: Arc<dyn Chunker>,
    progress: Arc<dyn ProgressSink>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    hybrid: bool,
    write_batch_size: usize,
}

impl IndexingCoordinator {
    /// Create a coordinator
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        registry: Arc<dyn CollectionRegistry>,
        vectors: Arc<dyn VectorStoreProvider>,
        gateway: Arc<EmbeddingGateway>,
        chunker: Arc<dyn Chunker>,
        progress: Arc<dyn ProgressSink>,
        hybrid: bool,
    ) -> Self {
        Self {
            metadata,
            registry,
            vectors,
            gateway,
            chunker,
            progress,
            locks: DashMap::new(),
            hybrid,
            write_batch_size: ccx_domain::constants::DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    /// Override the write batch size
    pub fn with_write_batch_size(mut self, size: usize) -> Self {
        self.write_batch_size = size.max(1);
        self
    }

    /// Run one indexing job to completion
    ///
    /// Emits exactly one terminal progress transition: `completed` with
    /// `expected == stored`, or `failed` with a classified cause.
    pub async fn index(&self, job: IndexJob, cancel: &CancellationToken) -> Result<IndexOutcome> {
        let key = job.scope.progress_key();
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock_owned().await;

        self.progress
            .begin(&key, &job.scope.project, &job.scope.dataset);

        match self.run(&job, cancel, &key).await {
            Ok(outcome) => {
                self.progress.complete(&key);
                info!(
                    scope = %job.scope,
                    chunks = outcome.chunks_stored,
                    points = outcome.point_count,
                    "indexing completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                let kind = if e.is_cancelled() {
                    FailureKind::Cancelled
                } else if e.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Error
                };
                self.progress.fail(&key, kind, &e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        job: &IndexJob,
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<IndexOutcome> {
        let scope = &job.scope;
        self.progress.phase(key, "resolving scope");

        let project = self.metadata.ensure_project(&scope.project).await?;
        let dataset = self
            .metadata
            .ensure_dataset(&project.id, &scope.dataset, &job.tags)
            .await?;
        let collection = scope.collection_name();

        let dimensions = self.gateway.dimensions();
        self.vectors
            .ensure_collection(&collection, dimensions, self.hybrid)
            .await?;

        self.progress.phase(key, "enumerating");
        let repo = match &job.source {
            IndexSource::LocalPath { repo, .. } => repo.clone(),
            IndexSource::Pages(_) => None,
        };
        let candidates = self.enumerate(&job.source).await?;

        let mut files_indexed = 0u64;
        let mut files_skipped = 0u64;
        let mut chunks_stored = 0u64;
        let mut pending: Vec<Chunk> = Vec::new();

        self.progress.phase(key, "indexing");
        for candidate in candidates {
            if cancel.is_cancelled() {
                return Err(Error::cancelled(format!("indexing of {scope} aborted")));
            }

            let normalized = Chunk::normalize(&candidate.content);
            let digest = Chunk::digest(&normalized);
            if job.mode == IndexMode::Incremental
                && self
                    .metadata
                    .chunk_exists(&dataset.id, &candidate.source_path, &digest)
                    .await?
            {
                debug!(path = %candidate.source_path, "unchanged, skipping");
                files_skipped += 1;
                continue;
            }

            let chunks = self
                .chunker
                .chunk(&dataset.id, &candidate.source_path, &candidate.content);
            if chunks.is_empty() {
                files_skipped += 1;
                continue;
            }

            files_indexed += 1;
            self.progress.add_expected(key, chunks.len() as u64);
            pending.extend(chunks);

            while pending.len() >= self.write_batch_size {
                let batch: Vec<Chunk> = pending.drain(..self.write_batch_size).collect();
                chunks_stored += self
                    .write_batch(&collection, &project.id, repo.as_deref(), &batch, cancel, key)
                    .await?;
            }
        }

        if !pending.is_empty() {
            let batch = std::mem::take(&mut pending);
            chunks_stored += self
                .write_batch(&collection, &project.id, repo.as_deref(), &batch, cancel, key)
                .await?;
        }

        self.progress.phase(key, "committing");
        let point_count = self
            .vectors
            .count_points(&collection, Some(dataset.id.as_str()))
            .await?;
        let upsert = self
            .registry
            .get_or_create(
                &dataset.id,
                &collection,
                VectorDbKind::Primary,
                dimensions,
                self.hybrid,
            )
            .await?;
        self.registry
            .update_metadata(&upsert.collection_id, point_count, chrono::Utc::now())
            .await?;

        Ok(IndexOutcome {
            chunks_stored,
            files_indexed,
            files_skipped,
            collection_name: collection,
            point_count,
        })
    }

    /// Embed and dual-write one batch; retried once before giving up
    async fn write_batch(
        &self,
        collection: &str,
        project_id: &str,
        repo: Option<&str>,
        batch: &[Chunk],
        cancel: &CancellationToken,
        key: &str,
    ) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(Error::cancelled("indexing aborted between batches"));
        }

        let mut attempt = 0;
        loop {
            match self.try_write_batch(collection, project_id, repo, batch).await {
                Ok(()) => {
                    self.progress.add_stored(key, batch.len() as u64);
                    return Ok(batch.len() as u64);
                }
                Err(e) if attempt == 0 && !e.is_cancelled() && !matches!(e, Error::EmbeddingAuth { .. }) => {
                    warn!(error = %e, "batch write failed, retrying once");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_write_batch(
        &self,
        collection: &str,
        project_id: &str,
        repo: Option<&str>,
        batch: &[Chunk],
    ) -> Result<()> {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let dense = self.gateway.embed_documents(&texts).await?;
        if dense.len() != batch.len() {
            return Err(Error::embedding(format!(
                "dense service returned {} vectors for {} texts",
                dense.len(),
                batch.len()
            )));
        }
        let sparse = if self.hybrid {
            self.gateway.embed_documents_sparse(&texts).await
        } else {
            None
        };

        let points: Vec<VectorPoint> = batch
            .iter()
            .zip(dense)
            .enumerate()
            .map(|(i, (chunk, embedding))| VectorPoint {
                id: chunk.id.clone(),
                dense: embedding,
                sparse: sparse.as_ref().map(|vectors| vectors[i].clone()),
                payload: ChunkPayload {
                    project_id: project_id.to_string(),
                    dataset_id: chunk.dataset_id.clone(),
                    source_path: chunk.source_path.clone(),
                    language: chunk.language.clone(),
                    symbol_name: chunk.symbol.name.clone(),
                    repo: repo.map(str::to_string),
                },
                content: chunk.content.clone(),
            })
            .collect();

        // Both writes carry the same dataset_id; on conflict the newer
        // content wins in either store.
        self.vectors.upsert_points(collection, &points).await?;
        self.metadata.upsert_chunks(batch).await?;
        Ok(())
    }

    async fn enumerate(&self, source: &IndexSource) -> Result<Vec<Candidate>> {
        match source {
            IndexSource::LocalPath { root, .. } => {
                let root = root.clone();
                let paths = tokio::task::spawn_blocking(move || walk_source_files(&root))
                    .await
                    .map_err(|e| Error::io(format!("walk task failed: {e}")))??;

                let mut candidates = Vec::with_capacity(paths.len());
                for (absolute, relative) in paths {
                    match tokio::fs::read_to_string(&absolute).await {
                        Ok(content) => candidates.push(Candidate {
                            source_path: relative,
                            content,
                        }),
                        Err(e) => {
                            debug!(path = %absolute.display(), error = %e, "unreadable, skipping");
                        }
                    }
                }
                Ok(candidates)
            }
            IndexSource::Pages(pages) => Ok(pages
                .iter()
                .map(|page| Candidate {
                    source_path: page.url.clone(),
                    content: page.markdown.clone(),
                })
                .collect()),
        }
    }
}

/// Walk a directory tree honoring gitignore rules, returning
/// (absolute, root-relative) paths of supported files
fn walk_source_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !root.exists() {
        return Err(Error::not_found(format!("path {}", root.display())));
    }

    let mut files = Vec::new();
    for entry in ignore::WalkBuilder::new(root).hidden(true).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "walk entry error, skipping");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            continue;
        }
        if entry.metadata().map(|m| m.len() > MAX_FILE_BYTES).unwrap_or(true) {
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push((path.to_path_buf(), relative));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}
