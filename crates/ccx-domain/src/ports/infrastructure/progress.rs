//! Progress sink port
//!
//! Non-blocking, O(1) updates into the process-wide progress map. All methods
//! are synchronous; implementations must not hold locks across await points
//! or let any lock escape.

use crate::value_objects::{FailureKind, ProgressRecord};

/// Write/read access to the progress fabric
pub trait ProgressSink: Send + Sync {
    /// Register an operation; resets any previous record under the same key
    fn begin(&self, key: &str, project: &str, dataset: &str);

    /// Update the free-form phase label
    fn phase(&self, key: &str, phase: &str);

    /// Raise the expected unit count (never lowers it below `stored`)
    fn add_expected(&self, key: &str, delta: u64);

    /// Record completed units; `stored` is monotone non-decreasing
    fn add_stored(&self, key: &str, delta: u64);

    /// Mark the operation completed; terminal, exactly once
    fn complete(&self, key: &str);

    /// Mark the operation failed with a classified cause; terminal
    fn fail(&self, key: &str, kind: FailureKind, message: &str);

    /// Snapshot one record
    fn snapshot(&self, key: &str) -> Option<ProgressRecord>;

    /// Snapshot all records for a project, optionally only non-terminal ones
    fn snapshot_project(&self, project: &str, active_only: bool) -> Vec<ProgressRecord>;

    /// Snapshot every record, optionally only non-terminal ones
    fn snapshot_all(&self, active_only: bool) -> Vec<ProgressRecord>;
}
