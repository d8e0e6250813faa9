//! Dataset selector expansion
//!
//! Resolves a `DatasetSelector` to the concrete set of datasets it covers,
//! using the metadata store. An empty result is legal and yields an empty
//! search response downstream, never an error.

use ccx_domain::entities::Dataset;
use ccx_domain::ports::MetadataStore;
use ccx_domain::scope::{glob_to_like, DatasetSelector};
use ccx_domain::Result;

/// Expand a selector into matching datasets, sorted by name
pub async fn expand_selector(
    metadata: &dyn MetadataStore,
    project_id: &str,
    selector: &DatasetSelector,
) -> Result<Vec<Dataset>> {
    let mut datasets = match selector {
        DatasetSelector::One(name) => match metadata.get_dataset(project_id, name).await? {
            Some(dataset) => vec![dataset],
            None => Vec::new(),
        },
        DatasetSelector::Many(names) => {
            let mut found = Vec::with_capacity(names.len());
            for name in names {
                if let Some(dataset) = metadata.get_dataset(project_id, name).await? {
                    found.push(dataset);
                }
            }
            found
        }
        DatasetSelector::Glob(glob) => {
            metadata
                .find_datasets_like(project_id, &glob_to_like(glob))
                .await?
        }
        DatasetSelector::All => metadata.list_datasets(project_id).await?,
        DatasetSelector::Alias { key, value } => {
            metadata.find_datasets_by_tag(project_id, key, value).await?
        }
    };

    datasets.sort_by(|a, b| a.name.cmp(&b.name));
    datasets.dedup_by(|a, b| a.id == b.id);
    Ok(datasets)
}
