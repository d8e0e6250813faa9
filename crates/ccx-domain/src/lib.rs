//! Domain layer for claude-context
//!
//! Core business types and port contracts for the indexing and retrieval
//! service. This crate performs no I/O; adapters implementing the port traits
//! live in `ccx-providers` and `ccx-infrastructure`.

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod scope;
pub mod value_objects;

pub use error::{Error, Result};
