//! Infrastructure layer for claude-context
//!
//! Cross-cutting technical concerns: configuration loading, structured
//! logging, the in-memory progress fabric, the user defaults file and the
//! system memory monitor.

pub mod config;
pub mod defaults;
pub mod logging;
pub mod memory;
pub mod progress;

pub use config::{AppConfig, ConfigLoader};
pub use defaults::ScopeDefaults;
pub use memory::{StaticMemoryMonitor, SysinfoMemoryMonitor};
pub use progress::ProgressTracker;
