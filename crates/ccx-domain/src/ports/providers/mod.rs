//! Provider ports: external service contracts

pub mod chunker;
pub mod crawler;
pub mod embedding;
pub mod llm;
pub mod vector_store;
