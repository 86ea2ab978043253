//! Change items produced by the diff engine

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreSide;

/// Which part of the configuration a change touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeCategory {
    Quiz,
    Rewards,
    Settings,
    FeatureFlags,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quiz => "quiz",
            Self::Rewards => "rewards",
            Self::Settings => "settings",
            Self::FeatureFlags => "featureFlags",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeAction {
    Add,
    Modify,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        })
    }
}

/// Severity of a change, ordered from least to most dangerous
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    #[default]
    Safe,
    Caution,
    Destructive,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Destructive => "destructive",
        })
    }
}

/// Old and new value of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

/// Everything needed to render a change without going back to the snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChangeDetails {
    /// Full copies of added or deleted collection items
    Entries { items: Vec<Value> },

    /// One modified quiz question
    #[serde(rename_all = "camelCase")]
    Question {
        id: String,
        old_question: Value,
        new_question: Value,
        changes: BTreeMap<String, FieldChange>,
    },

    /// One modified category or achievement
    #[serde(rename_all = "camelCase")]
    Entity {
        id: String,
        old_item: Value,
        new_item: Value,
        changes: BTreeMap<String, FieldChange>,
    },

    /// Per-key changes inside an object-like value
    Fields {
        changes: BTreeMap<String, FieldChange>,
    },

    /// A single keyed value; `None` means absent on that side
    #[serde(rename = "value")]
    Scalar {
        old: Option<Value>,
        new: Option<Value>,
    },
}

impl ChangeDetails {
    /// Names of the fields this change touches, where the shape has them
    pub fn changed_fields(&self) -> Vec<&str> {
        match self {
            Self::Question { changes, .. }
            | Self::Entity { changes, .. }
            | Self::Fields { changes } => {
                changes.keys().map(String::as_str).collect()
            }
            Self::Entries { .. } | Self::Scalar { .. } => Vec::new(),
        }
    }
}

/// One detected difference between a source and a target snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub category: ChangeCategory,
    pub field: String,
    pub action: ChangeAction,
    pub risk_level: RiskLevel,
    pub impact: String,
    /// Store the change will be written to
    pub target: StoreSide,
    pub details: ChangeDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Safe < RiskLevel::Caution);
        assert!(RiskLevel::Caution < RiskLevel::Destructive);
        assert_eq!(
            [RiskLevel::Caution, RiskLevel::Safe].into_iter().max(),
            Some(RiskLevel::Caution)
        );
    }

    #[test]
    fn details_serialize_with_kind_tag() {
        let details = ChangeDetails::Scalar {
            old: Some(json!(10)),
            new: None,
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["kind"], "value");
        assert_eq!(value["old"], 10);
        assert!(value["new"].is_null());

        let entity = ChangeDetails::Entity {
            id: "q1".into(),
            old_item: json!({}),
            new_item: json!({}),
            changes: BTreeMap::new(),
        };
        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["kind"], "entity");
        assert!(value.get("oldItem").is_some());

        let question = ChangeDetails::Question {
            id: "q1".into(),
            old_question: json!({"id": "q1"}),
            new_question: json!({"id": "q1"}),
            changes: BTreeMap::new(),
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["kind"], "question");
        assert_eq!(value["oldQuestion"]["id"], "q1");
        assert!(value.get("newQuestion").is_some());
    }

    #[test]
    fn changed_fields_lists_keys() {
        let mut changes = BTreeMap::new();
        changes.insert("correct".to_string(), FieldChange::new(json!(14), json!(20)));
        let details = ChangeDetails::Fields { changes };
        assert_eq!(details.changed_fields(), vec!["correct"]);
    }
}
