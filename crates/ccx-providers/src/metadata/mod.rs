//! Relational metadata store

pub mod libsql_store;

pub use libsql_store::LibsqlMetadataStore;
