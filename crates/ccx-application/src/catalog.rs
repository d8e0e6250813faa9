//! Catalog operations
//!
//! Read-only dataset listings and statistics, plus the destructive clear
//! path (with dry-run reporting).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use ccx_domain::entities::DatasetStatus;
use ccx_domain::ports::{ClearReport, CollectionRegistry, DatasetStats, MetadataStore, VectorStoreProvider};
use ccx_domain::scope::DatasetSelector;
use ccx_domain::Result;

use crate::expansion::expand_selector;

/// One row of a dataset listing
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    /// Dataset name
    pub name: String,
    /// Lifecycle status
    pub status: DatasetStatus,
    /// Bound collection, when the dataset has been indexed
    pub collection_name: Option<String>,
    /// Point count recorded at last successful index
    pub point_count: u64,
    /// Completion time of the last successful index
    pub last_indexed_at: Option<DateTime<Utc>>,
}

/// Catalog and clear operations over a project
pub struct CatalogService {
    metadata: Arc<dyn MetadataStore>,
    registry: Arc<dyn CollectionRegistry>,
    vectors: Arc<dyn VectorStoreProvider>,
}

impl CatalogService {
    /// Create a catalog service
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        registry: Arc<dyn CollectionRegistry>,
        vectors: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            metadata,
            registry,
            vectors,
        }
    }

    /// List datasets under a project with their collection bindings
    pub async fn list_datasets(&self, project_name: &str) -> Result<Vec<DatasetSummary>> {
        let Some(project) = self.metadata.get_project(project_name).await? else {
            return Ok(Vec::new());
        };
        let datasets = self.metadata.list_datasets(&project.id).await?;
        let listings = self.registry.list_for_project(project_name).await?;

        Ok(datasets
            .into_iter()
            .map(|dataset| {
                let binding = listings.iter().find(|l| l.dataset_name == dataset.name);
                DatasetSummary {
                    name: dataset.name,
                    status: dataset.status,
                    collection_name: binding.map(|l| l.collection_name.clone()),
                    point_count: binding.map(|l| l.point_count).unwrap_or(0),
                    last_indexed_at: binding.and_then(|l| l.last_indexed_at),
                }
            })
            .collect())
    }

    /// Aggregate statistics for one dataset
    pub async fn dataset_stats(
        &self,
        project_name: &str,
        dataset_name: &str,
    ) -> Result<Option<DatasetStats>> {
        let Some(project) = self.metadata.get_project(project_name).await? else {
            return Ok(None);
        };
        let Some(dataset) = self.metadata.get_dataset(&project.id, dataset_name).await? else {
            return Ok(None);
        };
        self.metadata.dataset_stats(&dataset.id).await.map(Some)
    }

    /// Delete (or report what would be deleted for) a scope
    ///
    /// With `dry_run` the report carries the counts a real clear would
    /// remove and nothing is mutated. A real clear removes vector points,
    /// chunk rows, the collection record and the dataset row.
    pub async fn clear(
        &self,
        project_name: &str,
        selector: Option<&DatasetSelector>,
        dry_run: bool,
    ) -> Result<ClearReport> {
        let Some(project) = self.metadata.get_project(project_name).await? else {
            return Ok(ClearReport::default());
        };
        let all = DatasetSelector::All;
        let selector = selector.unwrap_or(&all);
        let datasets = expand_selector(self.metadata.as_ref(), &project.id, selector).await?;

        let mut report = ClearReport::default();
        for dataset in datasets {
            let mut partial = self.metadata.count_for_clear(&dataset.id).await?;
            let collection = self.registry.resolve(project_name, &dataset.name).await?;
            if let Some(collection) = &collection {
                partial.points = self
                    .vectors
                    .count_points(collection, Some(dataset.id.as_str()))
                    .await
                    .unwrap_or(0);
            }

            if !dry_run {
                if let Some(collection) = &collection {
                    // One collection per dataset: dropping it removes every
                    // point the dataset owns.
                    self.vectors.drop_collection(collection).await?;
                }
                self.metadata.delete_dataset(&dataset.id).await?;
                info!(project = project_name, dataset = %dataset.name, "scope cleared");
            }
            report.absorb(&partial);
        }
        Ok(report)
    }
}
