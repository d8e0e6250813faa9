//! MCP tool metadata and dispatch

pub mod registry;
pub mod router;

pub use registry::create_tool_list;
pub use router::{route_tool_call, ToolHandlers};
