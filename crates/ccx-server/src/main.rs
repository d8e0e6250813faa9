//! claude-context server binary
//!
//! `ccx serve` runs the MCP stdio transport plus the HTTP surface; the
//! remaining subcommands are thin one-shot wrappers over the same services.

use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::Arc;

use ccx_domain::scope::DatasetSelector;
use ccx_domain::value_objects::{QueryFilters, QueryRequest};
use ccx_infrastructure::config::ConfigLoader;
use ccx_infrastructure::logging::init_logging;
use ccx_server::{build_context, http::http_router, AppContext, CcxMcpServer};

/// Command line interface for the claude-context server
#[derive(Parser, Debug)]
#[command(name = "ccx")]
#[command(about = "claude-context - hybrid code and web content retrieval service")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP stdio transport and the HTTP surface
    Serve,
    /// Index a local directory and wait for completion
    Index {
        /// Directory to ingest
        path: PathBuf,
        /// Target project
        #[arg(long)]
        project: Option<String>,
        /// Target dataset
        #[arg(long)]
        dataset: Option<String>,
        /// Re-embed everything
        #[arg(long)]
        force: bool,
    },
    /// Run one query and print the results as JSON
    Search {
        /// Query text
        query: String,
        /// Target project
        #[arg(long)]
        project: Option<String>,
        /// Dataset selector
        #[arg(long)]
        dataset: Option<String>,
        /// Result count
        #[arg(long, default_value_t = ccx_domain::constants::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Crawl a URL and wait for completion
    Crawl {
        /// Seed URL
        url: String,
        /// Crawl mode: single, batch, recursive or sitemap
        #[arg(long, default_value = "recursive")]
        mode: String,
        /// Target project
        #[arg(long)]
        project: Option<String>,
        /// Target dataset
        #[arg(long)]
        dataset: Option<String>,
        /// Maximum recursion depth
        #[arg(long, default_value_t = 2)]
        max_depth: u32,
        /// Hard page cap
        #[arg(long, default_value_t = 50)]
        max_pages: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load()?;
    init_logging(&config.logging)?;

    let context = build_context(config).await?;

    match cli.command {
        Command::Serve => serve(context).await,
        Command::Index {
            path,
            project,
            dataset,
            force,
        } => {
            let scope = context.resolve_scope(project.as_deref(), dataset.as_deref())?;
            let outcome = context
                .index_local(scope, path, force, None, Default::default())
                .await?;
            println!(
                "{}",
                serde_json::json!({
                    "chunks_stored": outcome.chunks_stored,
                    "files_indexed": outcome.files_indexed,
                    "files_skipped": outcome.files_skipped,
                    "collection": outcome.collection_name,
                    "point_count": outcome.point_count,
                })
            );
            Ok(())
        }
        Command::Search {
            query,
            project,
            dataset,
            top_k,
        } => {
            let scope = context.resolve_scope(project.as_deref(), dataset.as_deref())?;
            let selector = match dataset {
                Some(raw) => DatasetSelector::parse(&raw),
                None => DatasetSelector::One(scope.dataset.clone()),
            };
            let request = QueryRequest {
                project: scope.project,
                dataset_selector: selector,
                query_text: query,
                top_k,
                threshold: 0.0,
                filters: QueryFilters::default(),
            };
            let response = context.retrieval.search(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response.hits)?);
            Ok(())
        }
        Command::Crawl {
            url,
            mode,
            project,
            dataset,
            max_depth,
            max_pages,
        } => {
            let scope = context.resolve_scope(project.as_deref(), dataset.as_deref())?;
            let request = ccx_application::CrawlRequest {
                scope,
                seeds: vec![url],
                mode: ccx_application::CrawlMode::parse(&mode)?,
                max_depth,
                max_pages,
                same_domain_only: true,
            };
            let outcome = context.crawl.crawl(&request, &context.cancel).await?;
            println!(
                "{}",
                serde_json::json!({
                    "operation_id": outcome.operation_id,
                    "pages_fetched": outcome.pages_fetched,
                    "chunks_stored": outcome.chunks_stored,
                })
            );
            Ok(())
        }
    }
}

/// Run both transports until shutdown
async fn serve(context: Arc<AppContext>) -> anyhow::Result<()> {
    if context.config.server.enable_http {
        let addr: std::net::SocketAddr = context.config.server.http_addr.parse()?;
        let router = http_router(context.clone());
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "HTTP surface listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "HTTP surface failed");
            }
        });
    }

    let server = CcxMcpServer::new(context.clone());
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    context.cancel.cancel();
    Ok(())
}
