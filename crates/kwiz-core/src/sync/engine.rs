//! SyncEngine implementation
//!
//! The engine owns both stores and the sync history. Every mutating entry
//! point holds the history lock for its whole read-apply-record-persist
//! sequence, so two syncs never interleave. Listeners are called after the
//! lock is released.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use kwiz_fs::RobustnessConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listener::{ListenerId, ListenerRegistry, SyncEvent};
use super::plan::{self, SyncPlan};
use super::preview::{DataFreshness, FreshnessReport, PreviewSummary, SyncPreview};
use crate::config::EngineConfig;
use crate::conflict::{Resolution, detect_conflicts};
use crate::history::{
    OperationStatus, OperationType, PerformanceMetrics, RollbackPoint, SyncHistory, SyncOperation,
};
use crate::model::ConfigSnapshot;
use crate::store::{SnapshotStore, StoreSide};
use crate::{Error, Result};

/// Result of a mutating engine call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the call achieved what it was asked to do
    pub success: bool,
    /// Human-readable summary or error message
    pub message: String,
    /// Operation recorded or affected by the call, if any
    pub operation: Option<SyncOperation>,
}

impl SyncOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            operation: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            operation: None,
        }
    }

    pub fn with_operation(mut self, operation: SyncOperation) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// Snapshot of the engine's bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub last_operation: Option<SyncOperation>,
    pub operation_count: usize,
    pub rollback_point_count: usize,
    pub has_ancestor: bool,
}

/// Error raised while executing, plus the operation recorded for it
struct ExecutionFailure {
    error: Error,
    recorded: Option<SyncOperation>,
}

impl From<Error> for ExecutionFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            recorded: None,
        }
    }
}

/// Engine for synchronizing the admin and frontend configuration
///
/// The SyncEngine provides:
/// - **preview**: diff both stores and classify conflicts without writing
/// - **execute**: apply a confirmed preview and record it in history
/// - **undo / rollback**: restore stores from rollback points
pub struct SyncEngine {
    admin: Box<dyn SnapshotStore>,
    frontend: Box<dyn SnapshotStore>,
    config: EngineConfig,
    history_path: Option<PathBuf>,
    robustness: RobustnessConfig,
    history: Mutex<SyncHistory>,
    listeners: ListenerRegistry,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("history_path", &self.history_path)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create an engine with an in-memory history
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the stores are passed in the wrong
    /// order (their `side()` does not match the parameter), or if the
    /// retention caps are below their minimum.
    pub fn new(
        admin: Box<dyn SnapshotStore>,
        frontend: Box<dyn SnapshotStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        if admin.side() != StoreSide::Admin || frontend.side() != StoreSide::Frontend {
            return Err(Error::validation(format!(
                "stores must be (admin, frontend), got ({}, {})",
                admin.side(),
                frontend.side()
            )));
        }
        config.validate()?;

        Ok(Self {
            admin,
            frontend,
            config,
            history_path: None,
            robustness: RobustnessConfig::default(),
            history: Mutex::new(SyncHistory::new()),
            listeners: ListenerRegistry::default(),
        })
    }

    /// Load history from `path` and save it there after every mutation
    ///
    /// # Errors
    ///
    /// Returns an error if an existing history file cannot be read, or has an
    /// incompatible schema version.
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let history = SyncHistory::load(&path, self.robustness)?;
        tracing::debug!(
            path = %path.display(),
            operations = history.operations().len(),
            "Loaded sync history"
        );
        self.history = Mutex::new(history);
        self.history_path = Some(path);
        Ok(self)
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history_path(&self) -> Option<&Path> {
        self.history_path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, SyncHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, side: StoreSide) -> &dyn SnapshotStore {
        match side {
            StoreSide::Admin => self.admin.as_ref(),
            StoreSide::Frontend => self.frontend.as_ref(),
        }
    }

    fn persist(&self, history: &SyncHistory) -> Result<()> {
        if let Some(path) = &self.history_path {
            history.save(path, self.robustness)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    /// Preview an operation given by name (`pull`, `push`, `smart`, `reset`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown operation name, and any
    /// store or serialization error raised while diffing.
    pub fn generate_sync_preview(&self, operation_type: &str) -> Result<SyncPreview> {
        self.preview(operation_type.parse()?)
    }

    /// Diff both stores and classify conflicts for `op`. Nothing is written.
    pub fn preview(&self, op: OperationType) -> Result<SyncPreview> {
        let admin = self.admin.read()?;
        let frontend = self.frontend.read()?;
        let ancestor = self.lock().last_synced().cloned();

        let conflicts = detect_conflicts(&admin, &frontend, ancestor.as_ref(), op)?;
        let changes =
            plan::preview_changes(op, &admin, &frontend, ancestor.as_ref(), &conflicts)?;

        let payload_bytes = match op {
            OperationType::Push | OperationType::Reset => admin.serialized_size()?,
            OperationType::Pull => frontend.serialized_size()?,
            OperationType::Smart => admin.serialized_size()? + frontend.serialized_size()?,
        };
        let estimated_duration = self
            .config
            .estimate
            .estimate_ms(changes.len(), payload_bytes);

        let mut operation = SyncOperation::pending(op, changes);
        operation.performance_metrics = PerformanceMetrics {
            duration: estimated_duration,
            data_size: payload_bytes as u64,
            conflicts_resolved: conflicts.iter().filter(|c| !c.is_blocking()).count(),
        };

        let now = Utc::now();
        let freshness = &self.config.freshness;
        let preview = SyncPreview {
            summary: PreviewSummary::from_changes(&operation.changes, estimated_duration),
            data_freshness: FreshnessReport {
                admin: DataFreshness::classify(admin.newest_update(), now, freshness),
                frontend: DataFreshness::classify(frontend.newest_update(), now, freshness),
            },
            admin_fingerprint: admin.fingerprint()?,
            frontend_fingerprint: frontend.fingerprint()?,
            frontend_data: frontend,
            conflicts,
            operation,
        };

        tracing::debug!(
            operation = %op,
            changes = preview.summary.total_changes,
            conflicts = preview.conflicts.len(),
            risk = %preview.risk_level(),
            "Generated sync preview"
        );
        Ok(preview)
    }

    /// Generate a smart preview and hand it to every listener.
    ///
    /// Meant to be called from a UI polling timer; it never writes.
    pub fn refresh(&self) -> Result<SyncPreview> {
        let preview = self.preview(OperationType::Smart)?;
        self.listeners.notify(&SyncEvent::PreviewRefreshed {
            preview: Box::new(preview.clone()),
        });
        Ok(preview)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Apply a previewed operation.
    ///
    /// Unresolved manual conflicts, a stale preview or an invalid result are
    /// rejected before anything is written and are not recorded. A store
    /// failure during the writes is recorded as a failed operation, with any
    /// store already written restored first.
    pub fn execute_sync_operation(&self, preview: &SyncPreview) -> SyncOutcome {
        let result = {
            let mut history = self.lock();
            self.execute_locked(&mut history, preview)
        };

        match result {
            Ok(operation) => {
                self.listeners.notify(&SyncEvent::OperationRecorded {
                    operation: Box::new(operation.clone()),
                });
                SyncOutcome::success(format!(
                    "{} sync completed: {} change(s) applied",
                    operation.op_type,
                    operation.changes.len()
                ))
                .with_operation(operation)
            }
            Err(ExecutionFailure { error, recorded }) => {
                tracing::warn!(operation = %preview.operation.op_type, error = %error, "Sync failed");
                let outcome = SyncOutcome::failure(error.to_string());
                match recorded {
                    Some(operation) => {
                        self.listeners.notify(&SyncEvent::OperationRecorded {
                            operation: Box::new(operation.clone()),
                        });
                        outcome.with_operation(operation)
                    }
                    None => outcome,
                }
            }
        }
    }

    fn execute_locked(
        &self,
        history: &mut SyncHistory,
        preview: &SyncPreview,
    ) -> std::result::Result<SyncOperation, ExecutionFailure> {
        if preview.has_blocking_conflicts() {
            return Err(Error::ConflictBlocked {
                fields: preview.blocking_fields(),
            }
            .into());
        }
        if let Some(target) = preview.operation.op_type.target() {
            let direction = match target.other() {
                StoreSide::Admin => Resolution::AdminWins,
                StoreSide::Frontend => Resolution::FrontendWins,
            };
            let ignored: Vec<&str> = preview
                .conflicts
                .iter()
                .filter(|c| c.resolution != direction)
                .map(|c| c.field.as_str())
                .collect();
            if !ignored.is_empty() {
                tracing::debug!(
                    operation = %preview.operation.op_type,
                    fields = ?ignored,
                    "Ignoring conflict choices; the sync direction decides"
                );
            }
        }

        let admin = self.admin.read()?;
        let frontend = self.frontend.read()?;
        if admin.fingerprint()? != preview.admin_fingerprint
            || frontend.fingerprint()? != preview.frontend_fingerprint
        {
            return Err(Error::validation(
                "preview is stale: a store changed since it was generated",
            )
            .into());
        }

        let op = preview.operation.op_type;
        let ancestor = history.last_synced().cloned();
        let plan = plan::plan(op, &admin, &frontend, ancestor.as_ref(), &preview.conflicts)?;

        let started = Instant::now();
        let mut operation = SyncOperation::pending(op, plan.changes.clone());
        operation.id = preview.operation.id;

        let mut points = Vec::new();
        for side in &plan.targets {
            let current = match side {
                StoreSide::Admin => &admin,
                StoreSide::Frontend => &frontend,
            };
            let point = RollbackPoint::capture(
                *side,
                current.clone(),
                ancestor.clone(),
                format!("Before {} sync ({} store)", op, side),
            );
            operation.rollback_point_ids.push(point.id);
            points.push(point.clone());
            history.add_rollback_point(point);
        }

        let write_result = self.apply_writes(&plan, &points);
        operation.performance_metrics = PerformanceMetrics {
            duration: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            data_size: plan.payload_bytes as u64,
            conflicts_resolved: preview.conflicts.len(),
        };

        if let Err(error) = write_result {
            operation.error = Some(error.to_string());
            operation.transition(OperationStatus::Failed)?;
            history.record_operation(operation.clone());
            self.prune(history);
            if let Err(persist_error) = self.persist(history) {
                tracing::error!(error = %persist_error, "Failed to save sync history");
            }
            return Err(ExecutionFailure {
                error,
                recorded: Some(operation),
            });
        }

        operation.transition(OperationStatus::Completed)?;
        history.record_operation(operation.clone());
        history.set_last_synced(Some(plan.converged));
        self.prune(history);

        tracing::info!(
            operation = %op,
            id = %operation.id,
            changes = operation.changes.len(),
            risk = %operation.risk_level,
            duration_ms = operation.performance_metrics.duration,
            "Sync completed"
        );

        self.persist(history).map_err(|error| ExecutionFailure {
            error,
            recorded: Some(operation.clone()),
        })?;
        Ok(operation)
    }

    /// Perform the planned writes. If a later write fails, stores already
    /// written are put back from their rollback points.
    fn apply_writes(&self, plan: &SyncPlan, points: &[RollbackPoint]) -> Result<()> {
        for (index, write) in plan.writes.iter().enumerate() {
            tracing::debug!(side = %write.side, sections = write.sections.len(), "Writing store");
            if let Err(error) = self.store(write.side).write(&write.patch) {
                for done in plan.writes[..index].iter().rev() {
                    let Some(point) = points.iter().find(|p| p.target == done.side) else {
                        continue;
                    };
                    let restore = point.config_snapshot.patch_for(&done.sections);
                    if let Err(restore_error) = self.store(done.side).write(&restore) {
                        tracing::error!(
                            side = %done.side,
                            error = %restore_error,
                            "Failed to restore store after partial sync"
                        );
                    }
                }
                return Err(error);
            }
        }
        Ok(())
    }

    /// Write every point's snapshot back to its store, last point first.
    ///
    /// The current contents of each target are read before anything is
    /// written. If a write fails, the stores already restored are put back
    /// to those contents, so either every point is restored or no store
    /// changes.
    fn restore_points(&self, points: &[RollbackPoint]) -> Result<()> {
        let current = points
            .iter()
            .map(|point| self.store(point.target).read())
            .collect::<Result<Vec<_>>>()?;

        for (index, point) in points.iter().enumerate().rev() {
            tracing::debug!(side = %point.target, point = %point.id, "Restoring store");
            if let Err(error) = self
                .store(point.target)
                .write(&point.config_snapshot.full_patch())
            {
                for (done, snapshot) in points[index + 1..].iter().zip(&current[index + 1..]) {
                    if let Err(restore_error) = self.store(done.target).write(&snapshot.full_patch())
                    {
                        tracing::error!(
                            side = %done.target,
                            error = %restore_error,
                            "Failed to put store back after partial restore"
                        );
                    }
                }
                return Err(error);
            }
        }
        Ok(())
    }

    fn prune(&self, history: &mut SyncHistory) {
        let retention = &self.config.retention;
        history.prune(retention.max_operations, retention.max_rollback_points);
    }

    // ------------------------------------------------------------------
    // History and rollback
    // ------------------------------------------------------------------

    /// A copy of the full history
    pub fn get_sync_history(&self) -> SyncHistory {
        self.lock().clone()
    }

    pub fn status(&self) -> EngineStatus {
        let history = self.lock();
        EngineStatus {
            last_operation: history.operations().last().cloned(),
            operation_count: history.operations().len(),
            rollback_point_count: history.rollback_points().len(),
            has_ancestor: history.last_synced().is_some(),
        }
    }

    /// Revert the most recent completed operation.
    ///
    /// Every store the operation captured is restored, along with the last
    /// synced state, and the operation is marked rolled back.
    pub fn undo_last_sync(&self) -> SyncOutcome {
        let result = {
            let mut history = self.lock();
            self.undo_locked(&mut history)
        };

        match result {
            Ok((operation, point_ids)) => {
                self.listeners.notify(&SyncEvent::HistoryRestored {
                    rollback_point_ids: point_ids,
                });
                SyncOutcome::success(format!(
                    "Undid {} sync from {}",
                    operation.op_type,
                    operation.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
                ))
                .with_operation(operation)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Undo failed");
                SyncOutcome::failure(error.to_string())
            }
        }
    }

    fn undo_locked(&self, history: &mut SyncHistory) -> Result<(SyncOperation, Vec<Uuid>)> {
        let operation = history
            .last_completed()
            .cloned()
            .ok_or_else(|| Error::NotFound("No sync operations to undo".to_string()))?;

        let points = operation
            .rollback_point_ids
            .iter()
            .map(|id| {
                history.rollback_point(*id).cloned().ok_or_else(|| {
                    Error::corruption(format!(
                        "rollback point {} for operation {} is no longer retained",
                        id, operation.id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if points.is_empty() {
            return Err(Error::corruption(format!(
                "operation {} has no rollback points",
                operation.id
            )));
        }

        self.restore_points(&points)?;
        history.set_last_synced(points[0].ancestor.clone());

        let updated = {
            let entry = history.operation_mut(operation.id).ok_or_else(|| {
                Error::corruption(format!("operation {} vanished from history", operation.id))
            })?;
            entry.transition(OperationStatus::RolledBack)?;
            entry.clone()
        };

        tracing::info!(id = %updated.id, operation = %updated.op_type, "Undid sync");
        self.persist(history)?;
        Ok((updated, points.iter().map(|p| p.id).collect()))
    }

    /// Restore one store to the exact snapshot held by a rollback point.
    ///
    /// The operation that captured the point, and every later completed
    /// operation that wrote the same store, are marked rolled back. An
    /// unknown id leaves everything untouched.
    pub fn rollback_to_point(&self, id: Uuid) -> SyncOutcome {
        let result = {
            let mut history = self.lock();
            self.rollback_locked(&mut history, id)
        };

        match result {
            Ok(point) => {
                self.listeners.notify(&SyncEvent::HistoryRestored {
                    rollback_point_ids: vec![point.id],
                });
                SyncOutcome::success(format!(
                    "Restored {} store to rollback point '{}'",
                    point.target, point.description
                ))
            }
            Err(error) => {
                tracing::warn!(point = %id, error = %error, "Rollback failed");
                SyncOutcome::failure(error.to_string())
            }
        }
    }

    fn rollback_locked(&self, history: &mut SyncHistory, id: Uuid) -> Result<RollbackPoint> {
        let point = history
            .rollback_point(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("rollback point {}", id)))?;

        self.restore_points(std::slice::from_ref(&point))?;
        history.set_last_synced(point.ancestor.clone());

        let owner_index = history
            .operations()
            .iter()
            .position(|op| op.rollback_point_ids.contains(&id));
        let affected: Vec<Uuid> = history
            .operations()
            .iter()
            .enumerate()
            .filter(|(index, op)| match owner_index {
                Some(owner) => *index >= owner,
                None => op.timestamp >= point.timestamp,
            })
            .filter(|(_, op)| op.status == OperationStatus::Completed)
            .filter(|(_, op)| {
                op.op_type
                    .target()
                    .is_none_or(|target| target == point.target)
            })
            .map(|(_, op)| op.id)
            .collect();

        for op_id in &affected {
            if let Some(op) = history.operation_mut(*op_id) {
                op.transition(OperationStatus::RolledBack)?;
            }
        }

        tracing::info!(
            point = %id,
            side = %point.target,
            rolled_back = affected.len(),
            "Restored rollback point"
        );
        self.persist(history)?;
        Ok(point)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    pub fn add_sync_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    pub fn remove_sync_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Read the current snapshot of one side
    pub fn read_store(&self, side: StoreSide) -> Result<ConfigSnapshot> {
        self.store(side).read()
    }
}
