//! In-memory progress fabric
//!
//! One process-wide map from operation key to progress record. Updates are
//! O(1); the dashmap shard lock is held only for the duration of a single
//! record read or write and never escapes. A background sweep evicts
//! terminal records older than the TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use ccx_domain::constants::PROGRESS_TTL_SECS;
use ccx_domain::ports::ProgressSink;
use ccx_domain::value_objects::{FailureKind, ProgressError, ProgressRecord, ProgressStatus};

/// Concurrent progress map with TTL eviction
pub struct ProgressTracker {
    records: DashMap<String, ProgressRecord>,
}

impl ProgressTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Create a shared tracker
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Remove terminal records whose end time is older than `ttl`
    pub fn sweep(&self, ttl: Duration) {
        let cutoff = Utc::now() - chrono::Duration::from_std(ttl).unwrap_or_default();
        self.records.retain(|_, record| {
            let expired = record.status.is_terminal()
                && record.ended_at.map(|ended| ended < cutoff).unwrap_or(false);
            if expired {
                debug!(operation = %record.operation_id, "evicting terminal progress record");
            }
            !expired
        });
    }

    /// Spawn the background sweeper task
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let ttl = Duration::from_secs(PROGRESS_TTL_SECS);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tracker.sweep(ttl);
            }
        })
    }

    /// Number of tracked records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tracker is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressTracker {
    fn begin(&self, key: &str, project: &str, dataset: &str) {
        self.records.insert(
            key.to_string(),
            ProgressRecord {
                operation_id: key.to_string(),
                project: project.to_string(),
                dataset: dataset.to_string(),
                expected: 0,
                stored: 0,
                status: ProgressStatus::Starting,
                phase: "starting".to_string(),
                started_at: Utc::now(),
                ended_at: None,
                error: None,
            },
        );
    }

    fn phase(&self, key: &str, phase: &str) {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.status.is_terminal() {
                return;
            }
            record.phase = phase.to_string();
            record.status = ProgressStatus::Indexing;
        }
    }

    fn add_expected(&self, key: &str, delta: u64) {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.status.is_terminal() {
                return;
            }
            record.expected += delta;
        }
    }

    fn add_stored(&self, key: &str, delta: u64) {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.status.is_terminal() {
                return;
            }
            record.stored += delta;
            // invariant: expected >= stored at all times
            if record.expected < record.stored {
                record.expected = record.stored;
            }
        }
    }

    fn complete(&self, key: &str) {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.status.is_terminal() {
                return;
            }
            record.status = ProgressStatus::Completed;
            record.expected = record.stored;
            record.phase = "completed".to_string();
            record.ended_at = Some(Utc::now());
        }
    }

    fn fail(&self, key: &str, kind: FailureKind, message: &str) {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.status.is_terminal() {
                return;
            }
            record.status = ProgressStatus::Failed;
            record.phase = "failed".to_string();
            record.ended_at = Some(Utc::now());
            record.error = Some(ProgressError {
                kind,
                message: message.to_string(),
            });
        }
    }

    fn snapshot(&self, key: &str) -> Option<ProgressRecord> {
        self.records.get(key).map(|record| record.clone())
    }

    fn snapshot_project(&self, project: &str, active_only: bool) -> Vec<ProgressRecord> {
        let mut records: Vec<ProgressRecord> = self
            .records
            .iter()
            .filter(|entry| entry.project == project)
            .filter(|entry| !active_only || !entry.status.is_terminal())
            .map(|entry| entry.clone())
            .collect();
        records.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
        records
    }

    fn snapshot_all(&self, active_only: bool) -> Vec<ProgressRecord> {
        let mut records: Vec<ProgressRecord> = self
            .records
            .iter()
            .filter(|entry| !active_only || !entry.status.is_terminal())
            .map(|entry| entry.clone())
            .collect();
        records.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_is_monotone_and_bounded_by_expected() {
        let tracker = ProgressTracker::new();
        tracker.begin("index:p/d", "p", "d");
        tracker.add_expected("index:p/d", 10);
        tracker.add_stored("index:p/d", 4);
        tracker.add_stored("index:p/d", 3);

        let snapshot = tracker.snapshot("index:p/d").unwrap();
        assert_eq!(snapshot.stored, 7);
        assert!(snapshot.expected >= snapshot.stored);

        // stored overtaking expected raises expected
        tracker.add_stored("index:p/d", 10);
        let snapshot = tracker.snapshot("index:p/d").unwrap();
        assert_eq!(snapshot.stored, 17);
        assert_eq!(snapshot.expected, 17);
    }

    #[test]
    fn terminal_transitions_happen_exactly_once() {
        let tracker = ProgressTracker::new();
        tracker.begin("op", "p", "d");
        tracker.complete("op");
        // a late failure must not overwrite the completed terminal state
        tracker.fail("op", FailureKind::Error, "late error");

        let snapshot = tracker.snapshot("op").unwrap();
        assert_eq!(snapshot.status, ProgressStatus::Completed);
        assert!(snapshot.error.is_none());
        assert!(snapshot.ended_at.is_some());
    }

    #[test]
    fn failed_records_carry_the_cause() {
        let tracker = ProgressTracker::new();
        tracker.begin("op", "p", "d");
        tracker.fail("op", FailureKind::Cancelled, "caller cancelled");

        let snapshot = tracker.snapshot("op").unwrap();
        assert_eq!(snapshot.status, ProgressStatus::Failed);
        let error = snapshot.error.unwrap();
        assert_eq!(error.kind, FailureKind::Cancelled);
        assert!(error.message.contains("cancelled"));
    }

    #[test]
    fn sweep_evicts_only_old_terminal_records() {
        let tracker = ProgressTracker::new();
        tracker.begin("done", "p", "d");
        tracker.complete("done");
        tracker.begin("running", "p", "d");

        // nothing old enough yet
        tracker.sweep(Duration::from_secs(3600));
        assert_eq!(tracker.len(), 2);

        // zero TTL evicts the completed record but keeps the active one
        tracker.sweep(Duration::from_secs(0));
        assert!(tracker.snapshot("done").is_none());
        assert!(tracker.snapshot("running").is_some());
    }

    #[test]
    fn project_snapshots_filter_active() {
        let tracker = ProgressTracker::new();
        tracker.begin("a", "p1", "d1");
        tracker.begin("b", "p1", "d2");
        tracker.complete("b");
        tracker.begin("c", "p2", "d1");

        assert_eq!(tracker.snapshot_project("p1", false).len(), 2);
        assert_eq!(tracker.snapshot_project("p1", true).len(), 1);
        assert_eq!(tracker.snapshot_all(false).len(), 3);
    }
}
