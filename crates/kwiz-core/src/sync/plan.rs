//! Turning an operation type into concrete store writes

use std::collections::BTreeSet;

use crate::Result;
use crate::conflict::{ConflictResolution, merge_snapshots};
use crate::diff::{ChangeItem, detect_changes};
use crate::history::OperationType;
use crate::model::{ConfigSnapshot, Section, SnapshotPatch};
use crate::store::StoreSide;

/// One atomic store write
#[derive(Debug, Clone)]
pub(crate) struct PlannedWrite {
    pub side: StoreSide,
    pub sections: BTreeSet<Section>,
    pub patch: SnapshotPatch,
}

#[derive(Debug, Clone)]
pub(crate) struct SyncPlan {
    /// Stores captured in rollback points before anything is written
    pub targets: Vec<StoreSide>,
    pub writes: Vec<PlannedWrite>,
    pub changes: Vec<ChangeItem>,
    /// State both stores agree on once the plan is applied
    pub converged: ConfigSnapshot,
    /// Bytes of snapshot data the plan moves
    pub payload_bytes: usize,
}

/// Work out what `op` writes, given both stores and the last synced state.
///
/// # Errors
///
/// Fails with `ConflictBlocked` if a smart plan still has manual conflicts,
/// and with `Validation` if a resulting snapshot breaks the reward or
/// question rules.
pub(crate) fn plan(
    op: OperationType,
    admin: &ConfigSnapshot,
    frontend: &ConfigSnapshot,
    ancestor: Option<&ConfigSnapshot>,
    conflicts: &[ConflictResolution],
) -> Result<SyncPlan> {
    let plan = match op {
        OperationType::Push => one_way(op, admin, frontend, StoreSide::Frontend, false)?,
        OperationType::Reset => one_way(op, admin, frontend, StoreSide::Frontend, true)?,
        OperationType::Pull => one_way(op, frontend, admin, StoreSide::Admin, false)?,
        OperationType::Smart => {
            let merged = merge_snapshots(admin, frontend, ancestor, conflicts, None)?;
            let mut changes = detect_changes(&merged, admin, StoreSide::Admin, op)?;
            changes.extend(detect_changes(&merged, frontend, StoreSide::Frontend, op)?);

            let mut writes = Vec::new();
            for (side, current) in [(StoreSide::Admin, admin), (StoreSide::Frontend, frontend)] {
                let sections = merged.differing_sections(current);
                if !sections.is_empty() {
                    writes.push(PlannedWrite {
                        side,
                        patch: merged.patch_for(&sections),
                        sections,
                    });
                }
            }

            SyncPlan {
                targets: vec![StoreSide::Admin, StoreSide::Frontend],
                writes,
                changes,
                payload_bytes: admin.serialized_size()? + frontend.serialized_size()?,
                converged: merged,
            }
        }
    };

    plan.converged.validate()?;
    Ok(plan)
}

fn one_way(
    op: OperationType,
    source: &ConfigSnapshot,
    target: &ConfigSnapshot,
    target_side: StoreSide,
    whole: bool,
) -> Result<SyncPlan> {
    let sections = if whole {
        Section::ALL.into_iter().collect()
    } else {
        source.differing_sections(target)
    };

    let writes = if sections.is_empty() {
        Vec::new()
    } else {
        vec![PlannedWrite {
            side: target_side,
            patch: source.patch_for(&sections),
            sections,
        }]
    };

    Ok(SyncPlan {
        targets: vec![target_side],
        writes,
        changes: detect_changes(source, target, target_side, op)?,
        converged: source.clone(),
        payload_bytes: source.serialized_size()?,
    })
}

/// Changes a preview shows for `op`.
///
/// For a smart sync, manual conflicts are still open, so each side's
/// changes are computed with that side keeping its own value for them.
pub(crate) fn preview_changes(
    op: OperationType,
    admin: &ConfigSnapshot,
    frontend: &ConfigSnapshot,
    ancestor: Option<&ConfigSnapshot>,
    conflicts: &[ConflictResolution],
) -> Result<Vec<ChangeItem>> {
    match op {
        OperationType::Push | OperationType::Reset => {
            detect_changes(admin, frontend, StoreSide::Frontend, op)
        }
        OperationType::Pull => detect_changes(frontend, admin, StoreSide::Admin, op),
        OperationType::Smart => {
            let mut changes = Vec::new();
            for (side, current) in [(StoreSide::Admin, admin), (StoreSide::Frontend, frontend)] {
                let merged = merge_snapshots(admin, frontend, ancestor, conflicts, Some(side))?;
                changes.extend(detect_changes(&merged, current, side, op)?);
            }
            Ok(changes)
        }
    }
}
