//! Shared constants and tuning defaults

/// Reciprocal Rank Fusion constant (fixed; not configurable)
pub const RRF_K: f64 = 60.0;

/// Default number of results returned by a query
pub const DEFAULT_TOP_K: usize = 10;

/// Default candidate pool size handed to the reranker
pub const DEFAULT_RERANK_INITIAL_K: usize = 150;

/// Default embedding batch size for the dense client
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 64;

/// Default frontier partition size for recursive crawls
pub const DEFAULT_CRAWL_BATCH_SIZE: usize = 50;

/// Default number of concurrent fetches within a crawl batch
pub const DEFAULT_CRAWL_MAX_CONCURRENT: usize = 10;

/// Default resident-memory percentage above which crawl dispatch pauses
pub const DEFAULT_MEMORY_THRESHOLD_PERCENT: f32 = 80.0;

/// Default per-page fetch timeout in milliseconds
pub const DEFAULT_CRAWL_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Terminal progress records older than this are evicted
pub const PROGRESS_TTL_SECS: u64 = 3_600;

/// Deadline for status reads against external stores
pub const STATUS_DEADLINE_SECS: u64 = 10;

/// Bounded wait for `indexGitHub` when completion is requested
pub const GITHUB_WAIT_SECS: u64 = 120;

/// Dataset name used when auto-scoping a filesystem path
pub const DEFAULT_DATASET: &str = "local";

/// Default maximum output tokens for LLM synthesis
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 16_384;

/// Default sampling temperature for LLM synthesis
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.2;
