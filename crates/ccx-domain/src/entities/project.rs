//! Project and dataset entities
//!
//! A project is the top-level tenant; datasets subdivide it and are the unit
//! of indexing and query scoping. `(project_id, name)` is unique per dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logical tenant owning datasets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Stable identifier
    pub id: String,
    /// Human name; unique within the store
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Dataset lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStatus {
    /// Dataset is queryable and indexable
    Active,
    /// Dataset is retained but excluded from wildcard expansion
    Archived,
}

impl DatasetStatus {
    /// Stable string form used in the relational store
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStatus::Active => "active",
            DatasetStatus::Archived => "archived",
        }
    }
}

/// Named subdivision of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    /// Stable identifier
    pub id: String,
    /// Owning project id
    pub project_id: String,
    /// Dataset name; unique within the project
    pub name: String,
    /// Lifecycle status
    pub status: DatasetStatus,
    /// Conventional metadata tags (`env`, `src`, `branch`, ...) used by
    /// semantic alias expansion
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
