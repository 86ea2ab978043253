//! Field-level comparison of JSON values

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use super::change::FieldChange;
use crate::Result;
use crate::model::QuizQuestion;

/// Key used when two values being compared are not both objects
pub const WHOLE_VALUE_KEY: &str = "value";

/// Compare two values key by key at the top level.
///
/// Keys missing on one side are reported as `null` on that side. Nested
/// values (arrays, objects) are compared whole, so an `options` change is
/// one entry carrying both full arrays.
pub fn diff_object(old: &Value, new: &Value) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();

    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            for (key, old_value) in old_obj {
                let new_value = new_obj.get(key).unwrap_or(&Value::Null);
                if old_value != new_value {
                    changes.insert(
                        key.clone(),
                        FieldChange::new(old_value.clone(), new_value.clone()),
                    );
                }
            }
            for (key, new_value) in new_obj {
                if !old_obj.contains_key(key) {
                    changes.insert(key.clone(), FieldChange::new(Value::Null, new_value.clone()));
                }
            }
        }
        _ => {
            if old != new {
                changes.insert(
                    WHOLE_VALUE_KEY.to_string(),
                    FieldChange::new(old.clone(), new.clone()),
                );
            }
        }
    }

    changes
}

/// Field changes between two versions of the same entity
pub fn entity_changes<T: Serialize>(old: &T, new: &T) -> Result<BTreeMap<String, FieldChange>> {
    Ok(diff_object(
        &serde_json::to_value(old)?,
        &serde_json::to_value(new)?,
    ))
}

/// Question changes, with `correctAnswer` resolved to `{index, text}`
pub fn question_changes(
    old: &QuizQuestion,
    new: &QuizQuestion,
) -> Result<BTreeMap<String, FieldChange>> {
    let mut changes = entity_changes(old, new)?;
    if let Some(change) = changes.get_mut("correctAnswer") {
        change.old = answer_value(old);
        change.new = answer_value(new);
    }
    Ok(changes)
}

fn answer_value(question: &QuizQuestion) -> Value {
    json!({
        "index": question.correct_answer,
        "text": question.correct_option(),
    })
}

/// Render a value for an impact line: strings bare, everything else as JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
