//! Sync history: operations, rollback points and the last synced state
//!
//! The history is the engine's ledger. Operations are only ever appended;
//! afterwards the only mutation allowed on an entry is a status transition.
//! It persists as versioned JSON through `kwiz_fs::io`, which handles
//! locking and atomic replacement.

mod operation;
mod rollback;

pub use operation::{
    OperationStatus, OperationType, PerformanceMetrics, SyncDirection, SyncOperation,
};
pub use rollback::RollbackPoint;

use std::path::Path;

use kwiz_fs::{RobustnessConfig, io};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::ConfigSnapshot;
use crate::{Error, Result};

/// Current on-disk schema version
pub const HISTORY_SCHEMA_VERSION: Version = Version::new(1, 0, 0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistory {
    version: Version,
    #[serde(default)]
    operations: Vec<SyncOperation>,
    #[serde(default)]
    rollback_points: Vec<RollbackPoint>,
    /// Common ancestor for conflict detection
    #[serde(default)]
    last_synced: Option<ConfigSnapshot>,
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncHistory {
    pub fn new() -> Self {
        Self {
            version: HISTORY_SCHEMA_VERSION,
            operations: Vec::new(),
            rollback_points: Vec::new(),
            last_synced: None,
        }
    }

    /// Load a history file under a shared lock.
    ///
    /// A missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] if the schema version is missing or has a
    /// different major version, and an IO or JSON error if the file cannot be
    /// read or parsed.
    pub fn load(path: &Path, robustness: RobustnessConfig) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = io::read_text_locked(path, robustness)?;
        let raw: Value = serde_json::from_str(&content)?;

        let version = raw
            .get("version")
            .and_then(Value::as_str)
            .and_then(|v| Version::parse(v).ok())
            .ok_or_else(|| {
                Error::corruption(format!("{} has no valid schema version", path.display()))
            })?;
        if version.major != HISTORY_SCHEMA_VERSION.major {
            return Err(Error::corruption(format!(
                "{} uses history schema {}, expected {}.x",
                path.display(),
                version,
                HISTORY_SCHEMA_VERSION.major
            )));
        }

        Ok(serde_json::from_value(raw)?)
    }

    /// Save atomically under an exclusive lock
    pub fn save(&self, path: &Path, robustness: RobustnessConfig) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)?;
        io::write_atomic(path, &content, robustness)?;
        Ok(())
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// All operations, oldest first
    pub fn operations(&self) -> &[SyncOperation] {
        &self.operations
    }

    /// All retained rollback points, oldest first
    pub fn rollback_points(&self) -> &[RollbackPoint] {
        &self.rollback_points
    }

    pub fn last_synced(&self) -> Option<&ConfigSnapshot> {
        self.last_synced.as_ref()
    }

    pub fn set_last_synced(&mut self, snapshot: Option<ConfigSnapshot>) {
        self.last_synced = snapshot;
    }

    pub fn record_operation(&mut self, operation: SyncOperation) {
        self.operations.push(operation);
    }

    pub fn add_rollback_point(&mut self, point: RollbackPoint) {
        self.rollback_points.push(point);
    }

    pub fn operation(&self, id: Uuid) -> Option<&SyncOperation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn operation_mut(&mut self, id: Uuid) -> Option<&mut SyncOperation> {
        self.operations.iter_mut().find(|op| op.id == id)
    }

    pub fn rollback_point(&self, id: Uuid) -> Option<&RollbackPoint> {
        self.rollback_points.iter().find(|p| p.id == id)
    }

    /// Most recent operation that completed and has not been rolled back
    pub fn last_completed(&self) -> Option<&SyncOperation> {
        self.operations
            .iter()
            .rev()
            .find(|op| op.status == OperationStatus::Completed)
    }

    /// Newest `limit` operations, newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &SyncOperation> {
        self.operations.iter().rev().take(limit)
    }

    /// Evict the oldest entries beyond the given caps.
    ///
    /// Points of the most recent completed operation are never evicted, so
    /// it can always be undone. Older operations keep their
    /// `rollback_point_ids` after a point is evicted; undoing such an
    /// operation reports the missing point.
    pub fn prune(&mut self, max_operations: usize, max_rollback_points: usize) {
        if self.operations.len() > max_operations {
            let excess = self.operations.len() - max_operations;
            self.operations.drain(..excess);
        }

        let protected: Vec<Uuid> = self
            .last_completed()
            .map(|op| op.rollback_point_ids.clone())
            .unwrap_or_default();
        let mut excess = self.rollback_points.len().saturating_sub(max_rollback_points);
        self.rollback_points.retain(|point| {
            if excess > 0 && !protected.contains(&point.id) {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreSide;
    use tempfile::tempdir;

    fn completed(op_type: OperationType) -> SyncOperation {
        let mut op = SyncOperation::pending(op_type, vec![]);
        op.transition(OperationStatus::Completed).unwrap();
        op
    }

    fn point() -> RollbackPoint {
        RollbackPoint::capture(StoreSide::Frontend, ConfigSnapshot::default(), None, "test")
    }

    #[test]
    fn new_history_has_current_version() {
        let history = SyncHistory::new();
        assert_eq!(history.version(), &HISTORY_SCHEMA_VERSION);
        assert!(history.operations().is_empty());
        assert!(history.last_synced().is_none());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let history =
            SyncHistory::load(&dir.path().join("history.json"), RobustnessConfig::default())
                .unwrap();
        assert_eq!(history, SyncHistory::new());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = SyncHistory::new();
        history.add_rollback_point(point());
        history.record_operation(completed(OperationType::Push));
        history.set_last_synced(Some(ConfigSnapshot::default()));
        history.save(&path, RobustnessConfig::default()).unwrap();

        let loaded = SyncHistory::load(&path, RobustnessConfig::default()).unwrap();
        assert_eq!(loaded, history);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": \"1.0.0\""));
        assert!(raw.contains("\"rollbackPoints\""));
    }

    #[test]
    fn last_completed_skips_other_statuses() {
        let mut history = SyncHistory::new();
        let first = completed(OperationType::Push);
        let first_id = first.id;
        history.record_operation(first);

        let mut failed = SyncOperation::pending(OperationType::Pull, vec![]);
        failed.transition(OperationStatus::Failed).unwrap();
        history.record_operation(failed);

        assert_eq!(history.last_completed().map(|op| op.id), Some(first_id));
    }

    #[test]
    fn prune_evicts_oldest_first() {
        let mut history = SyncHistory::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let op = completed(OperationType::Push);
            ids.push(op.id);
            history.record_operation(op);
            history.add_rollback_point(point());
        }

        history.prune(3, 2);
        assert_eq!(history.operations().len(), 3);
        assert_eq!(history.operations()[0].id, ids[2]);
        assert_eq!(history.rollback_points().len(), 2);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut history = SyncHistory::new();
        let a = completed(OperationType::Push);
        let b = completed(OperationType::Pull);
        let b_id = b.id;
        history.record_operation(a);
        history.record_operation(b);

        let recent: Vec<Uuid> = history.recent(1).map(|op| op.id).collect();
        assert_eq!(recent, vec![b_id]);
    }

    #[test]
    fn prune_keeps_points_of_last_completed_operation() {
        let mut history = SyncHistory::new();
        history.add_rollback_point(point());

        let mut op = completed(OperationType::Smart);
        let (admin, frontend) = (point(), point());
        op.rollback_point_ids = vec![admin.id, frontend.id];
        history.add_rollback_point(admin.clone());
        history.add_rollback_point(frontend.clone());
        history.record_operation(op);

        history.prune(100, 1);
        let kept: Vec<Uuid> = history.rollback_points().iter().map(|p| p.id).collect();
        assert_eq!(kept, vec![admin.id, frontend.id]);
    }
}
