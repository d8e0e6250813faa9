//! claude-context server
//!
//! Transport and protocol layer: the `claudeContext.*` MCP tool surface,
//! the HTTP API and the wiring that assembles providers into services.

pub mod args;
pub mod bootstrap;
pub mod formatter;
pub mod handlers;
pub mod http;
pub mod mcp_server;
pub mod state;
pub mod tools;

pub use bootstrap::build_context;
pub use mcp_server::CcxMcpServer;
pub use state::AppContext;
