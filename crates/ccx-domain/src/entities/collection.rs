//! Collection record entity
//!
//! The (dataset -> vector collection) binding. Exactly one record exists per
//! dataset after its first successful index; `resolve` on the registry is the
//! sole lookup path readers use to locate a dataset's vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which vector database holds a collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VectorDbKind {
    /// The configured primary store
    Primary,
    /// The fallback store (in-memory / development)
    Fallback,
}

impl VectorDbKind {
    /// Stable string form used in the relational store
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorDbKind::Primary => "primary",
            VectorDbKind::Fallback => "fallback",
        }
    }

    /// Parse the stable string form
    pub fn parse(s: &str) -> VectorDbKind {
        match s {
            "fallback" => VectorDbKind::Fallback,
            _ => VectorDbKind::Primary,
        }
    }
}

/// Authoritative dataset-to-collection binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionRecord {
    /// Stable identifier
    pub id: String,
    /// Owning dataset id; unique (one collection per dataset)
    pub dataset_id: String,
    /// Deterministically derived collection name; unique
    pub collection_name: String,
    /// Which vector database holds the collection
    pub vector_db_kind: VectorDbKind,
    /// Dense vector dimension the collection was created with
    pub embedding_dimension: usize,
    /// Whether the collection carries a sparse vector slot
    pub hybrid_enabled: bool,
    /// Point count recorded after the last successful index
    pub point_count: u64,
    /// Completion time of the last successful index
    pub last_indexed_at: Option<DateTime<Utc>>,
}
