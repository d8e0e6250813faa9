//! Progress snapshot value objects
//!
//! In-memory records describing long-running operations. Snapshots are plain
//! values; the concurrent map holding them lives in the infrastructure layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a tracked operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Operation registered, no work done yet
    Starting,
    /// Work in flight
    Indexing,
    /// Terminal: all expected units stored
    Completed,
    /// Terminal: operation aborted
    Failed,
}

impl ProgressStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }
}

/// Why a tracked operation failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Generic error
    Error,
    /// Caller-initiated cancellation
    Cancelled,
    /// Deadline expiry
    Timeout,
}

/// Failure detail carried by a failed progress record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressError {
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

/// Snapshot of one long-running operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Operation key (`index:{project}/{dataset}` or a crawl operation id)
    pub operation_id: String,
    /// Project the operation belongs to
    pub project: String,
    /// Dataset the operation belongs to
    pub dataset: String,
    /// Units of work expected; never less than `stored`
    pub expected: u64,
    /// Units of work completed; non-decreasing until terminal
    pub stored: u64,
    /// Current status
    pub status: ProgressStatus,
    /// Free-form phase label ("enumerating", "embedding", ...)
    pub phase: String,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// Completion timestamp once terminal
    pub ended_at: Option<DateTime<Utc>>,
    /// Failure detail when status is `Failed`
    pub error: Option<ProgressError>,
}
