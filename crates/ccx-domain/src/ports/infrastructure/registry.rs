//! Collection registry port
//!
//! The authoritative dataset-to-collection mapping, persisted relationally.
//! `resolve` is total for any dataset that has ever been indexed
//! successfully; indexing must not report success before `get_or_create`
//! commits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::VectorDbKind;
use crate::error::Result;

/// Outcome of a `get_or_create` upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUpsert {
    /// Collection record id
    pub collection_id: String,
    /// Whether the record was freshly inserted by this call
    pub freshly_created: bool,
}

/// One row of `list_for_project`
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionListing {
    /// Dataset name
    pub dataset_name: String,
    /// Bound collection name
    pub collection_name: String,
    /// Point count recorded at last successful index
    pub point_count: u64,
    /// Completion time of the last successful index
    pub last_indexed_at: Option<DateTime<Utc>>,
}

/// Authoritative dataset-to-collection mapping
#[async_trait]
pub trait CollectionRegistry: Send + Sync {
    /// Atomic upsert keyed on `dataset_id`; concurrent calls are safe and
    /// exactly one record survives
    async fn get_or_create(
        &self,
        dataset_id: &str,
        collection_name: &str,
        vector_db_kind: VectorDbKind,
        embedding_dimension: usize,
        hybrid_enabled: bool,
    ) -> Result<RegistryUpsert>;

    /// Single-row metadata update after a successful index
    async fn update_metadata(
        &self,
        collection_id: &str,
        point_count: u64,
        last_indexed_at: DateTime<Utc>,
    ) -> Result<()>;

    /// The sole lookup path for the retrieval pipeline
    async fn resolve(&self, project_name: &str, dataset_name: &str) -> Result<Option<String>>;

    /// List every collection binding under a project
    async fn list_for_project(&self, project_name: &str) -> Result<Vec<CollectionListing>>;
}
