//! Configuration loading
//!
//! Figment merges defaults, an optional TOML file and `CCX__`-prefixed
//! environment variables (double underscore separates nesting levels). The
//! flat environment names from the deployment convention
//! (`ENABLE_HYBRID_SEARCH`, `CRAWL_BATCH_SIZE`, `LLM_API_KEY`, ...) are
//! applied as a final override pass, with the legacy `MINIMAX_*` names
//! accepted as aliases for the LLM group.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use ccx_domain::constants::{
    DEFAULT_CRAWL_BATCH_SIZE, DEFAULT_CRAWL_MAX_CONCURRENT, DEFAULT_CRAWL_PAGE_TIMEOUT_MS,
    DEFAULT_EMBED_BATCH_SIZE, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_TEMPERATURE,
    DEFAULT_MEMORY_THRESHOLD_PERCENT, DEFAULT_RERANK_INITIAL_K, DEFAULT_TOP_K,
};
use ccx_domain::{Error, Result};

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP surface
    pub http_addr: String,
    /// Whether to start the HTTP surface alongside the MCP transport
    pub enable_http: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8410".to_string(),
            enable_http: true,
        }
    }
}

/// Store endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the relational metadata database
    pub metadata_path: String,
    /// Vector store backend: "qdrant" or "memory"
    pub vector_backend: String,
    /// Vector store URL (qdrant backend)
    pub vector_url: String,
    /// Vector store API key
    pub vector_api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            metadata_path: "~/.local/share/claude-context/metadata.db".to_string(),
            vector_backend: "qdrant".to_string(),
            vector_url: "http://localhost:6333".to_string(),
            vector_api_key: None,
        }
    }
}

/// Embedding service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Dense embedding service base URL
    pub dense_url: String,
    /// Sparse embedding service base URL (hybrid search)
    pub sparse_url: Option<String>,
    /// Reranker service base URL
    pub rerank_url: Option<String>,
    /// Shared API key for the embedding services
    pub api_key: Option<String>,
    /// Dense vector dimension the service produces
    pub dimension: usize,
    /// Batch size for embedding requests
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dense_url: "http://localhost:8080".to_string(),
            sparse_url: None,
            rerank_url: None,
            api_key: None,
            dimension: 768,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            timeout_secs: 30,
        }
    }
}

/// Retrieval feature toggles and tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Enable dense+sparse hybrid search
    pub enable_hybrid_search: bool,
    /// Enable the reranking stage
    pub enable_reranking: bool,
    /// Candidate pool handed to the reranker
    pub rerank_initial_k: usize,
    /// Default result count
    pub default_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enable_hybrid_search: false,
            enable_reranking: false,
            rerank_initial_k: DEFAULT_RERANK_INITIAL_K,
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

/// Crawl tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Crawler runtime base URL
    pub crawler_url: String,
    /// Frontier partition size
    pub batch_size: usize,
    /// Concurrent fetches within a batch
    pub max_concurrent: usize,
    /// Used-memory percentage above which dispatch pauses
    pub memory_threshold_percent: f32,
    /// Per-page timeout in milliseconds
    pub page_timeout_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            crawler_url: "http://localhost:8600".to_string(),
            batch_size: DEFAULT_CRAWL_BATCH_SIZE,
            max_concurrent: DEFAULT_CRAWL_MAX_CONCURRENT,
            memory_threshold_percent: DEFAULT_MEMORY_THRESHOLD_PERCENT,
            page_timeout_ms: DEFAULT_CRAWL_PAGE_TIMEOUT_MS,
        }
    }
}

/// LLM synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; smart query is disabled when absent
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL
    pub api_base: String,
    /// Model name
    pub model: String,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter ("trace" ... "error")
    pub level: String,
    /// Emit JSON instead of human-readable lines
    pub json_format: bool,
    /// Optional log file path (daily rotation)
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP surface
    pub server: ServerConfig,
    /// Store endpoints
    pub stores: StoreConfig,
    /// Embedding services
    pub embedding: EmbeddingConfig,
    /// Retrieval toggles and tuning
    pub retrieval: RetrievalConfig,
    /// Crawl tuning
    pub crawl: CrawlConfig,
    /// LLM synthesis
    pub llm: LlmConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Expand a leading `~` in the metadata path
    pub fn metadata_path_expanded(&self) -> PathBuf {
        expand_home(&self.stores.metadata_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Configuration loader service
#[derive(Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader using the default config file location
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration file
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from defaults, file, environment and flat aliases
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        let config_path = self
            .config_path
            .clone()
            .or_else(Self::default_config_path);
        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                tracing::info!(path = %path.display(), "configuration file loaded");
            }
        }

        figment = figment.merge(Env::prefixed("CCX__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to extract configuration: {e}")))?;

        apply_flat_env(&mut config);
        validate(&config)?;
        Ok(config)
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("claude-context").join("config.toml"))
    }
}

fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

fn env_parse<T: std::str::FromStr>(names: &[&str]) -> Option<T> {
    env_var(names).and_then(|v| v.parse().ok())
}

fn env_bool(names: &[&str]) -> Option<bool> {
    env_var(names).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Apply the flat deployment-convention names on top of the merged config
fn apply_flat_env(config: &mut AppConfig) {
    if let Some(v) = env_bool(&["ENABLE_HYBRID_SEARCH"]) {
        config.retrieval.enable_hybrid_search = v;
    }
    if let Some(v) = env_bool(&["ENABLE_RERANKING"]) {
        config.retrieval.enable_reranking = v;
    }
    if let Some(v) = env_parse(&["RERANK_INITIAL_K"]) {
        config.retrieval.rerank_initial_k = v;
    }
    if let Some(v) = env_parse(&["CRAWL_BATCH_SIZE"]) {
        config.crawl.batch_size = v;
    }
    if let Some(v) = env_parse(&["CRAWL_MAX_CONCURRENT"]) {
        config.crawl.max_concurrent = v;
    }
    if let Some(v) = env_parse(&["MEMORY_THRESHOLD_PERCENT"]) {
        config.crawl.memory_threshold_percent = v;
    }
    if let Some(v) = env_parse(&["CRAWL_PAGE_TIMEOUT"]) {
        config.crawl.page_timeout_ms = v;
    }

    if let Some(v) = env_var(&["LLM_API_KEY", "MINIMAX_API_KEY"]) {
        config.llm.api_key = Some(v);
    }
    if let Some(v) = env_var(&["LLM_API_BASE", "MINIMAX_API_BASE"]) {
        config.llm.api_base = v;
    }
    if let Some(v) = env_var(&["MODEL_NAME", "MINIMAX_MODEL"]) {
        config.llm.model = v;
    }
    if let Some(v) = env_parse(&["LLM_MAX_TOKENS", "MINIMAX_MAX_TOKENS"]) {
        config.llm.max_tokens = v;
    }
    if let Some(v) = env_parse(&["LLM_TEMPERATURE", "MINIMAX_TEMPERATURE"]) {
        config.llm.temperature = v;
    }

    if let Some(v) = env_var(&["VECTOR_STORE_URL", "QDRANT_URL"]) {
        config.stores.vector_url = v;
    }
    if let Some(v) = env_var(&["METADATA_DB_PATH"]) {
        config.stores.metadata_path = v;
    }
    if let Some(v) = env_var(&["EMBEDDING_SERVICE_URL"]) {
        config.embedding.dense_url = v;
    }
    if let Some(v) = env_var(&["SPARSE_SERVICE_URL"]) {
        config.embedding.sparse_url = Some(v);
    }
    if let Some(v) = env_var(&["RERANKER_SERVICE_URL"]) {
        config.embedding.rerank_url = Some(v);
    }
    if let Some(v) = env_var(&["CRAWLER_SERVICE_URL"]) {
        config.crawl.crawler_url = v;
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.embedding.dimension == 0 {
        return Err(Error::config("embedding.dimension must be positive"));
    }
    if config.embedding.batch_size == 0 {
        return Err(Error::config("embedding.batch_size must be positive"));
    }
    if !(0.0..=100.0).contains(&config.crawl.memory_threshold_percent) {
        return Err(Error::config(
            "crawl.memory_threshold_percent must be between 0 and 100",
        ));
    }
    match config.stores.vector_backend.as_str() {
        "qdrant" | "memory" => Ok(()),
        other => Err(Error::config(format!(
            "unknown vector backend '{other}', use 'qdrant' or 'memory'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.retrieval.rerank_initial_k, 150);
        assert_eq!(config.crawl.batch_size, 50);
        assert_eq!(config.crawl.max_concurrent, 10);
        assert_eq!(config.crawl.page_timeout_ms, 30_000);
        assert_eq!(config.llm.max_tokens, 16_384);
    }

    #[test]
    fn bad_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.stores.vector_backend = "chroma".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[retrieval]\nenable_hybrid_search = true\nrerank_initial_k = 99\n",
        )
        .unwrap();

        let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
        assert!(config.retrieval.enable_hybrid_search);
        assert_eq!(config.retrieval.rerank_initial_k, 99);
        // untouched sections keep their defaults
        assert_eq!(config.crawl.batch_size, 50);
    }
}
