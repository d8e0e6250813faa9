//! Relational metadata store port
//!
//! Holds projects, datasets and chunks. Dataset rows are the relational
//! isolation boundary; chunk upserts ride in per-batch transactions with
//! newer content winning on conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::entities::{Chunk, Dataset, Project};
use crate::error::Result;

/// Aggregate statistics for one dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStats {
    /// Chunk rows in the relational store
    pub chunk_count: u64,
    /// Distinct source files or pages
    pub file_count: u64,
    /// Point count recorded by the registry
    pub point_count: u64,
    /// Completion time of the last successful index
    pub last_indexed_at: Option<DateTime<Utc>>,
}

/// Counts removed (or that would be removed) by a clear operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Dataset rows
    pub datasets: u64,
    /// Chunk rows
    pub chunks: u64,
    /// Vector points
    pub points: u64,
    /// Collection records
    pub collections: u64,
}

impl ClearReport {
    /// Sum another report into this one
    pub fn absorb(&mut self, other: &ClearReport) {
        self.datasets += other.datasets;
        self.chunks += other.chunks;
        self.points += other.points;
        self.collections += other.collections;
    }
}

/// Relational store for projects, datasets and chunks
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch or create a project by name
    async fn ensure_project(&self, name: &str) -> Result<Project>;

    /// Fetch a project by name
    async fn get_project(&self, name: &str) -> Result<Option<Project>>;

    /// Fetch or create a dataset; `tags` are merged into the row when the
    /// dataset already exists
    async fn ensure_dataset(
        &self,
        project_id: &str,
        name: &str,
        tags: &HashMap<String, String>,
    ) -> Result<Dataset>;

    /// Fetch a dataset by name within a project
    async fn get_dataset(&self, project_id: &str, name: &str) -> Result<Option<Dataset>>;

    /// List active datasets under a project
    async fn list_datasets(&self, project_id: &str) -> Result<Vec<Dataset>>;

    /// Find active datasets whose name matches a SQL `LIKE` pattern
    /// (escaped with `\`)
    async fn find_datasets_like(&self, project_id: &str, pattern: &str) -> Result<Vec<Dataset>>;

    /// Find active datasets carrying a tag key/value pair
    async fn find_datasets_by_tag(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<Dataset>>;

    /// Upsert a batch of chunks in one transaction; newer content wins
    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Whether any chunk exists for this (dataset, path, document digest)
    async fn chunk_exists(
        &self,
        dataset_id: &str,
        source_path: &str,
        content_digest: &str,
    ) -> Result<bool>;

    /// Aggregate statistics for a dataset
    async fn dataset_stats(&self, dataset_id: &str) -> Result<DatasetStats>;

    /// Count what a clear of this dataset would remove, mutating nothing
    async fn count_for_clear(&self, dataset_id: &str) -> Result<ClearReport>;

    /// Delete the dataset row, its chunks and its collection record
    async fn delete_dataset(&self, dataset_id: &str) -> Result<ClearReport>;
}
