//! Three-way merging of values and whole snapshots

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{Map, Value};

use super::flatten::{self, FieldMap};
use super::resolution::{ConflictResolution, Resolution};
use crate::Result;
use crate::model::ConfigSnapshot;
use crate::store::StoreSide;

/// Merge two edits of the same value against their common ancestor.
///
/// Objects merge key by key: a key changed on one side takes that side's
/// value, a key changed on both sides takes the newer side's value. Any
/// other value is taken whole from the newer side.
pub fn three_way_merge(
    ancestor: Option<&Value>,
    admin: &Value,
    frontend: &Value,
    admin_newer: bool,
) -> Value {
    let (Value::Object(a), Value::Object(f)) = (admin, frontend) else {
        return if admin_newer { admin } else { frontend }.clone();
    };
    let o = ancestor.and_then(Value::as_object);

    let keys: BTreeSet<&String> = a.keys().chain(f.keys()).collect();
    let mut merged = Map::new();
    for key in keys {
        let av = a.get(key);
        let fv = f.get(key);
        let ov = o.and_then(|o| o.get(key));

        let chosen = if av == fv {
            av
        } else if av == ov {
            fv
        } else if fv == ov {
            av
        } else if admin_newer {
            av
        } else {
            fv
        };

        if let Some(value) = chosen {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

/// Settle a field nobody is in conflict over
fn settle<'a>(
    admin: Option<&'a Value>,
    frontend: Option<&'a Value>,
    ancestor: Option<&FieldMap>,
    path: &str,
) -> Option<&'a Value> {
    if admin == frontend {
        return admin;
    }
    let Some(ancestor) = ancestor else {
        return admin.or(frontend);
    };
    let base = ancestor.get(path).map(|e| &e.value);
    if admin == base { frontend } else { admin }
}

/// Build the converged snapshot for a smart sync.
///
/// Fields in `conflicts` take their resolved value, every other field takes
/// whichever side changed it since `ancestor`. A manual conflict keeps the
/// value of `unresolved_side` when one is given, which is how a preview
/// shows each side's pending changes before the caller decides.
///
/// # Errors
///
/// Returns [`crate::Error::ConflictBlocked`] if a conflict is still manual
/// and no `unresolved_side` is given.
pub fn merge_snapshots(
    admin: &ConfigSnapshot,
    frontend: &ConfigSnapshot,
    ancestor: Option<&ConfigSnapshot>,
    conflicts: &[ConflictResolution],
    unresolved_side: Option<StoreSide>,
) -> Result<ConfigSnapshot> {
    let a = flatten::flatten(admin)?;
    let f = flatten::flatten(frontend)?;
    let o = ancestor.map(flatten::flatten).transpose()?;

    let by_field: HashMap<&str, &ConflictResolution> =
        conflicts.iter().map(|c| (c.field.as_str(), c)).collect();
    let paths: BTreeSet<&String> = a.keys().chain(f.keys()).collect();

    let mut values = BTreeMap::new();
    for path in paths {
        let av = a.get(path).map(|e| &e.value);
        let fv = f.get(path).map(|e| &e.value);

        let chosen = match by_field.get(path.as_str()) {
            Some(conflict) => match (conflict.resolution, unresolved_side) {
                (Resolution::Manual, Some(StoreSide::Admin)) => av.cloned(),
                (Resolution::Manual, Some(StoreSide::Frontend)) => fv.cloned(),
                _ => conflict.chosen_value()?,
            },
            None => settle(av, fv, o.as_ref(), path).cloned(),
        };

        if let Some(value) = chosen {
            values.insert(path.clone(), value);
        }
    }

    flatten::rebuild(admin, frontend, &values)
}
