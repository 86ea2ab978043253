//! Conflict classifier
//!
//! Both snapshots (and the last synced ancestor, when there is one) are
//! flattened into dotted field paths. A field is in conflict only when both
//! sides moved away from the ancestor and did not land on the same value.

mod flatten;
mod merge;
mod resolution;

pub use flatten::{FieldEntry, FieldMap, category_of, flatten, is_monetary};
pub use merge::{merge_snapshots, three_way_merge};
pub use resolution::{ConflictChoice, ConflictResolution, Resolution};

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::history::OperationType;
use crate::model::{ConfigSnapshot, Section};

/// Find fields changed independently on both sides since `last_synced`.
///
/// Without an ancestor, a smart sync reports every difference as a manual
/// conflict. One-directional operations report none, since the direction
/// already decides the outcome.
pub fn detect_conflicts(
    admin: &ConfigSnapshot,
    frontend: &ConfigSnapshot,
    last_synced: Option<&ConfigSnapshot>,
    op: OperationType,
) -> Result<Vec<ConflictResolution>> {
    if last_synced.is_none() && op != OperationType::Smart {
        return Ok(Vec::new());
    }

    let a = flatten(admin)?;
    let f = flatten(frontend)?;
    let o = last_synced.map(flatten).transpose()?;

    let mut paths: BTreeSet<&String> = a.keys().chain(f.keys()).collect();
    if let Some(o) = &o {
        paths.extend(o.keys());
    }

    let mut conflicts = Vec::new();
    for path in paths {
        let av = a.get(path);
        let fv = f.get(path);
        let admin_value = av.map(|e| &e.value);
        let frontend_value = fv.map(|e| &e.value);

        if admin_value == frontend_value {
            continue;
        }
        let ancestor_value = match &o {
            Some(o) => {
                let ov = o.get(path).map(|e| &e.value);
                if admin_value == ov || frontend_value == ov {
                    continue;
                }
                Some(ov)
            }
            None => None,
        };

        let admin_timestamp = timestamp(av, admin, path);
        let frontend_timestamp = timestamp(fv, frontend, path);

        let mut conflict = ConflictResolution {
            field: path.clone(),
            category: category_of(path),
            admin_value: admin_value.cloned(),
            frontend_value: frontend_value.cloned(),
            admin_timestamp,
            frontend_timestamp,
            resolution: Resolution::Manual,
            merged_value: None,
        };

        let resolution = match (op, ancestor_value) {
            (OperationType::Push | OperationType::Reset, _) => Resolution::AdminWins,
            (OperationType::Pull, _) => Resolution::FrontendWins,
            (OperationType::Smart, None) => Resolution::Manual,
            (OperationType::Smart, Some(_)) if is_monetary(path) || conflict.is_destructive() => {
                Resolution::Manual
            }
            (OperationType::Smart, Some(base)) => {
                if let (Some(av), Some(fv)) = (admin_value, frontend_value) {
                    conflict.merged_value = Some(three_way_merge(
                        base,
                        av,
                        fv,
                        admin_timestamp >= frontend_timestamp,
                    ));
                }
                Resolution::Merge
            }
        };
        conflict.resolution = resolution;

        conflicts.push(conflict);
    }

    Ok(conflicts)
}

/// When a field was last touched; a deleted field uses its section's time
fn timestamp(entry: Option<&FieldEntry>, snapshot: &ConfigSnapshot, path: &str) -> DateTime<Utc> {
    entry
        .map(|e| e.modified_at)
        .unwrap_or_else(|| snapshot.section_updated_at(section_of(path)))
}

fn section_of(path: &str) -> Section {
    if path.starts_with("quiz.") {
        Section::Quiz
    } else if path.starts_with("rewards.") {
        Section::Rewards
    } else {
        Section::Settings
    }
}
