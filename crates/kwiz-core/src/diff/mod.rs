//! Diff engine: turn two snapshots into an ordered list of change items
//!
//! Collections (questions, categories, achievements) are paired by id.
//! Additions and deletions are grouped into one item per collection, while
//! each modified entity gets its own item. Object-like values (coin values,
//! quiz settings, popup settings) produce one item with per-key changes,
//! and keyed maps (config values, feature flags) one item per key.
//!
//! Items are emitted in a fixed order so that two diffs of the same pair of
//! snapshots are identical.

mod change;
mod fields;
mod risk;
mod text;

pub use change::{ChangeAction, ChangeCategory, ChangeDetails, ChangeItem, FieldChange, RiskLevel};
pub use fields::{diff_object, display_value};
pub use risk::classify;
pub use text::inline_text_diff;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::history::OperationType;
use crate::model::{ConfigSnapshot, Keyed};
use crate::store::StoreSide;

/// Changes needed to turn `target` into `source`.
///
/// `target_side` is recorded on every item so that smart operations, which
/// write both stores, can say where each change lands.
pub fn detect_changes(
    source: &ConfigSnapshot,
    target: &ConfigSnapshot,
    target_side: StoreSide,
    op: OperationType,
) -> Result<Vec<ChangeItem>> {
    let mut diff = Differ {
        op,
        target_side,
        items: Vec::new(),
    };

    diff.collection(
        ChangeCategory::Quiz,
        Noun::QUESTION,
        &source.quiz.questions,
        &target.quiz.questions,
        fields::question_changes,
    )?;
    diff.collection(
        ChangeCategory::Quiz,
        Noun::CATEGORY,
        &source.quiz.categories,
        &target.quiz.categories,
        fields::entity_changes,
    )?;
    diff.object(
        ChangeCategory::Quiz,
        "settings",
        "Quiz settings updated",
        &target.quiz.settings,
        &source.quiz.settings,
    );

    diff.collection(
        ChangeCategory::Rewards,
        Noun::ACHIEVEMENT,
        &source.rewards.achievements,
        &target.rewards.achievements,
        fields::entity_changes,
    )?;
    diff.object(
        ChangeCategory::Rewards,
        "coinValues",
        "Coin values updated",
        &serde_json::to_value(target.rewards.coin_values)?,
        &serde_json::to_value(source.rewards.coin_values)?,
    );
    diff.object(
        ChangeCategory::Rewards,
        "popupSettings",
        "Reward popup settings updated",
        &target.rewards.popup_settings,
        &source.rewards.popup_settings,
    );

    diff.keyed(
        ChangeCategory::Settings,
        &source.settings.config_values,
        &target.settings.config_values,
    );
    let source_flags = flags_as_values(&source.settings.feature_flags);
    let target_flags = flags_as_values(&target.settings.feature_flags);
    diff.keyed(ChangeCategory::FeatureFlags, &source_flags, &target_flags);

    Ok(diff.items)
}

fn flags_as_values(flags: &BTreeMap<String, bool>) -> BTreeMap<String, Value> {
    flags
        .iter()
        .map(|(k, v)| (k.clone(), Value::Bool(*v)))
        .collect()
}

fn modified_details<T: Serialize>(
    noun: Noun,
    id: &str,
    old: &T,
    new: &T,
    changes: BTreeMap<String, FieldChange>,
) -> Result<ChangeDetails> {
    let id = id.to_string();
    let (old, new) = (serde_json::to_value(old)?, serde_json::to_value(new)?);
    Ok(if noun == Noun::QUESTION {
        ChangeDetails::Question {
            id,
            old_question: old,
            new_question: new,
            changes,
        }
    } else {
        ChangeDetails::Entity {
            id,
            old_item: old,
            new_item: new,
            changes,
        }
    })
}

/// Singular and plural names of a collection, plus its field name
#[derive(Clone, Copy, PartialEq, Eq)]
struct Noun {
    field: &'static str,
    one: &'static str,
    many: &'static str,
}

impl Noun {
    const QUESTION: Noun = Noun {
        field: "questions",
        one: "question",
        many: "questions",
    };
    const CATEGORY: Noun = Noun {
        field: "categories",
        one: "category",
        many: "categories",
    };
    const ACHIEVEMENT: Noun = Noun {
        field: "achievements",
        one: "achievement",
        many: "achievements",
    };

    fn word(&self, n: usize) -> &'static str {
        if n == 1 { self.one } else { self.many }
    }
}

struct Differ {
    op: OperationType,
    target_side: StoreSide,
    items: Vec<ChangeItem>,
}

impl Differ {
    fn push(
        &mut self,
        category: ChangeCategory,
        field: String,
        action: ChangeAction,
        impact: String,
        details: ChangeDetails,
    ) {
        let risk_level = classify(self.op, category, &field, action);
        self.items.push(ChangeItem {
            category,
            field,
            action,
            risk_level,
            impact,
            target: self.target_side,
            details,
        });
    }

    fn collection<T, F>(
        &mut self,
        category: ChangeCategory,
        noun: Noun,
        source: &[T],
        target: &[T],
        entity_diff: F,
    ) -> Result<()>
    where
        T: Keyed + Serialize + PartialEq,
        F: Fn(&T, &T) -> Result<BTreeMap<String, FieldChange>>,
    {
        let source_ids: BTreeSet<&str> = source.iter().map(Keyed::key).collect();
        let target_by_id: HashMap<&str, &T> = target.iter().map(|t| (t.key(), t)).collect();

        let added: Vec<&T> = source
            .iter()
            .filter(|s| !target_by_id.contains_key(s.key()))
            .collect();
        let removed: Vec<&T> = target
            .iter()
            .filter(|t| !source_ids.contains(t.key()))
            .collect();

        if !added.is_empty() {
            self.push(
                category,
                noun.field.to_string(),
                ChangeAction::Add,
                format!("Adding {} new {}", added.len(), noun.word(added.len())),
                ChangeDetails::Entries {
                    items: to_values(&added)?,
                },
            );
        }

        if !removed.is_empty() {
            self.push(
                category,
                noun.field.to_string(),
                ChangeAction::Delete,
                format!("Removing {} {}", removed.len(), noun.word(removed.len())),
                ChangeDetails::Entries {
                    items: to_values(&removed)?,
                },
            );
        }

        for item in source {
            let Some(&existing) = target_by_id.get(item.key()) else {
                continue;
            };
            if existing == item {
                continue;
            }
            let changes = entity_diff(existing, item)?;
            let impact = format!(
                "Modifying {} '{}' ({})",
                noun.one,
                item.key(),
                changes.keys().cloned().collect::<Vec<_>>().join(", ")
            );
            self.push(
                category,
                noun.field.to_string(),
                ChangeAction::Modify,
                impact,
                modified_details(noun, item.key(), existing, item, changes)?,
            );
        }

        Ok(())
    }

    fn object(
        &mut self,
        category: ChangeCategory,
        field: &str,
        label: &str,
        old: &Value,
        new: &Value,
    ) {
        let changes = diff_object(old, new);
        if changes.is_empty() {
            return;
        }

        let summary = changes
            .iter()
            .map(|(key, change)| {
                format!(
                    "{} {} → {}",
                    key,
                    display_value(&change.old),
                    display_value(&change.new)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.push(
            category,
            field.to_string(),
            ChangeAction::Modify,
            format!("{}: {}", label, summary),
            ChangeDetails::Fields { changes },
        );
    }

    fn keyed(
        &mut self,
        category: ChangeCategory,
        source: &BTreeMap<String, Value>,
        target: &BTreeMap<String, Value>,
    ) {
        let keys: BTreeSet<&String> = source.keys().chain(target.keys()).collect();

        for key in keys {
            let old = target.get(key);
            let new = source.get(key);
            let action = match (old, new) {
                (None, Some(_)) => ChangeAction::Add,
                (Some(_), None) => ChangeAction::Delete,
                (Some(o), Some(n)) if o != n => ChangeAction::Modify,
                _ => continue,
            };

            let (field, impact) = match category {
                ChangeCategory::FeatureFlags => (key.clone(), flag_impact(key, action, new)),
                _ => (
                    format!("configValues.{}", key),
                    config_impact(key, action, old, new),
                ),
            };

            self.push(
                category,
                field,
                action,
                impact,
                ChangeDetails::Scalar {
                    old: old.cloned(),
                    new: new.cloned(),
                },
            );
        }
    }
}

fn to_values<T: Serialize>(items: &[&T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Into::into))
        .collect()
}

fn config_impact(
    key: &str,
    action: ChangeAction,
    old: Option<&Value>,
    new: Option<&Value>,
) -> String {
    match (action, old, new) {
        (ChangeAction::Add, _, Some(n)) => {
            format!("Adding config value '{}' = {}", key, display_value(n))
        }
        (ChangeAction::Modify, Some(o), Some(n)) => format!(
            "Changing config value '{}': {} → {}",
            key,
            display_value(o),
            display_value(n)
        ),
        _ => format!("Removing config value '{}'", key),
    }
}

fn flag_impact(flag: &str, action: ChangeAction, new: Option<&Value>) -> String {
    let enabled = new.and_then(Value::as_bool).unwrap_or(false);
    match action {
        ChangeAction::Add => format!(
            "Adding feature flag '{}' ({})",
            flag,
            if enabled { "enabled" } else { "disabled" }
        ),
        ChangeAction::Modify if enabled => format!("Enabling feature flag '{}'", flag),
        ChangeAction::Modify => format!("Disabling feature flag '{}'", flag),
        ChangeAction::Delete => format!("Removing feature flag '{}'", flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Achievement, QuizQuestion};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn question(id: &str) -> QuizQuestion {
        QuizQuestion::new(id, format!("Question {}?", id), vec!["a".into(), "b".into()], 0)
    }

    fn push_changes(source: &ConfigSnapshot, target: &ConfigSnapshot) -> Vec<ChangeItem> {
        detect_changes(source, target, StoreSide::Frontend, OperationType::Push).unwrap()
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let mut snapshot = ConfigSnapshot::default();
        snapshot.quiz.questions.push(question("q1"));
        assert!(push_changes(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn additions_are_grouped() {
        let target = ConfigSnapshot::default();
        let mut source = target.clone();
        source.quiz.questions.push(question("q1"));
        source.quiz.questions.push(question("q2"));

        let changes = push_changes(&source, &target);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Add);
        assert_eq!(changes[0].impact, "Adding 2 new questions");
        assert_eq!(changes[0].target, StoreSide::Frontend);
        match &changes[0].details {
            ChangeDetails::Entries { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0]["id"], "q1");
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn modify_items_are_per_entity() {
        let mut target = ConfigSnapshot::default();
        target.quiz.questions.push(question("q1"));
        target.quiz.questions.push(question("q2"));
        let mut source = target.clone();
        source.quiz.questions[0].question = "Changed?".into();
        source.quiz.questions[1].options.push("c".into());

        let changes = push_changes(&source, &target);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.action == ChangeAction::Modify));
        assert_eq!(changes[0].impact, "Modifying question 'q1' (question)");
        assert_eq!(changes[1].impact, "Modifying question 'q2' (options)");

        match &changes[0].details {
            ChangeDetails::Question {
                id,
                old_question,
                new_question,
                changes,
            } => {
                assert_eq!(id, "q1");
                assert_eq!(old_question["question"], "Question q1?");
                assert_eq!(new_question["question"], "Changed?");
                assert_eq!(changes["question"].new, "Changed?");
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn coin_values_are_one_caution_item() {
        let mut target = ConfigSnapshot::default();
        target.rewards.coin_values.correct = 14;
        let mut source = target.clone();
        source.rewards.coin_values.correct = 20;
        source.rewards.coin_values.bonus = 60;

        let changes = push_changes(&source, &target);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "coinValues");
        assert_eq!(changes[0].risk_level, RiskLevel::Caution);
        assert_eq!(changes[0].details.changed_fields(), vec!["bonus", "correct"]);
    }

    #[test]
    fn config_values_and_flags_are_per_key() {
        let mut target = ConfigSnapshot::default();
        target
            .settings
            .config_values
            .insert("maxQuestions".into(), json!(10));
        target.settings.feature_flags.insert("old".into(), true);

        let mut source = ConfigSnapshot::default();
        source
            .settings
            .config_values
            .insert("maxQuestions".into(), json!(20));
        source.settings.config_values.insert("theme".into(), json!("dark"));
        source.settings.feature_flags.insert("beta".into(), true);

        let changes = push_changes(&source, &target);
        let summary: Vec<(ChangeCategory, &str, ChangeAction)> = changes
            .iter()
            .map(|c| (c.category, c.field.as_str(), c.action))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    ChangeCategory::Settings,
                    "configValues.maxQuestions",
                    ChangeAction::Modify
                ),
                (
                    ChangeCategory::Settings,
                    "configValues.theme",
                    ChangeAction::Add
                ),
                (ChangeCategory::FeatureFlags, "beta", ChangeAction::Add),
                (ChangeCategory::FeatureFlags, "old", ChangeAction::Delete),
            ]
        );
    }

    #[test]
    fn achievement_delete_is_caution() {
        let mut target = ConfigSnapshot::default();
        target
            .rewards
            .achievements
            .push(Achievement::new("first", "First steps"));
        let source = ConfigSnapshot::default();

        let changes = push_changes(&source, &target);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Delete);
        assert_eq!(changes[0].risk_level, RiskLevel::Caution);
        assert_eq!(changes[0].impact, "Removing 1 achievement");
    }

    #[test]
    fn reset_marks_everything_destructive() {
        let target = ConfigSnapshot::default();
        let mut source = target.clone();
        source.quiz.questions.push(question("q1"));

        let changes =
            detect_changes(&source, &target, StoreSide::Frontend, OperationType::Reset).unwrap();
        assert_eq!(changes[0].risk_level, RiskLevel::Destructive);
    }
}
