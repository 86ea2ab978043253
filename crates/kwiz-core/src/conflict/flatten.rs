//! Flattening snapshots into dotted field paths and back

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::Result;
use crate::diff::ChangeCategory;
use crate::model::{ConfigSnapshot, Keyed, Section};

pub const QUESTIONS: &str = "quiz.questions.";
pub const CATEGORIES: &str = "quiz.categories.";
pub const QUIZ_SETTINGS: &str = "quiz.settings";
pub const ACHIEVEMENTS: &str = "rewards.achievements.";
pub const COIN_VALUES: &str = "rewards.coinValues.";
pub const POPUP_SETTINGS: &str = "rewards.popupSettings";
pub const CONFIG_VALUES: &str = "settings.configValues.";
pub const FEATURE_FLAGS: &str = "featureFlags.";

/// One flattened field and when it was last modified
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub value: Value,
    pub modified_at: DateTime<Utc>,
}

pub type FieldMap = BTreeMap<String, FieldEntry>;

/// Category a flattened path belongs to
pub fn category_of(path: &str) -> ChangeCategory {
    if path.starts_with("quiz.") {
        ChangeCategory::Quiz
    } else if path.starts_with("rewards.") {
        ChangeCategory::Rewards
    } else if path.starts_with("settings.") {
        ChangeCategory::Settings
    } else {
        ChangeCategory::FeatureFlags
    }
}

/// Whether a path carries monetary values
pub fn is_monetary(path: &str) -> bool {
    path.starts_with(COIN_VALUES)
}

/// Flatten a snapshot into independent field entries
pub fn flatten(snapshot: &ConfigSnapshot) -> Result<FieldMap> {
    let mut map = FieldMap::new();

    let quiz_at = snapshot.quiz.updated_at;
    keyed_entries(&mut map, QUESTIONS, &snapshot.quiz.questions, quiz_at)?;
    keyed_entries(&mut map, CATEGORIES, &snapshot.quiz.categories, quiz_at)?;
    insert(&mut map, QUIZ_SETTINGS, snapshot.quiz.settings.clone(), quiz_at);

    let rewards_at = snapshot.rewards.updated_at;
    keyed_entries(
        &mut map,
        ACHIEVEMENTS,
        &snapshot.rewards.achievements,
        rewards_at,
    )?;
    if let Value::Object(coins) = serde_json::to_value(snapshot.rewards.coin_values)? {
        for (key, value) in coins {
            insert(&mut map, format!("{}{}", COIN_VALUES, key), value, rewards_at);
        }
    }
    insert(
        &mut map,
        POPUP_SETTINGS,
        snapshot.rewards.popup_settings.clone(),
        rewards_at,
    );

    let settings_at = snapshot.settings.updated_at;
    for (key, value) in &snapshot.settings.config_values {
        insert(
            &mut map,
            format!("{}{}", CONFIG_VALUES, key),
            value.clone(),
            settings_at,
        );
    }
    for (flag, enabled) in &snapshot.settings.feature_flags {
        insert(
            &mut map,
            format!("{}{}", FEATURE_FLAGS, flag),
            Value::Bool(*enabled),
            settings_at,
        );
    }

    Ok(map)
}

fn insert(map: &mut FieldMap, path: impl Into<String>, value: Value, at: DateTime<Utc>) {
    map.insert(
        path.into(),
        FieldEntry {
            value,
            modified_at: at,
        },
    );
}

fn keyed_entries<T: Keyed + Serialize>(
    map: &mut FieldMap,
    prefix: &str,
    items: &[T],
    section_at: DateTime<Utc>,
) -> Result<()> {
    for item in items {
        insert(
            map,
            format!("{}{}", prefix, item.key()),
            serde_json::to_value(item)?,
            item.modified_at().unwrap_or(section_at),
        );
    }
    Ok(())
}

/// Rebuild a snapshot from field values.
///
/// Collections keep the admin order, followed by items only the frontend
/// has. Each section's `updatedAt` and `version` come from whichever side
/// modified that section more recently (admin on a tie).
pub fn rebuild(
    admin: &ConfigSnapshot,
    frontend: &ConfigSnapshot,
    values: &BTreeMap<String, Value>,
) -> Result<ConfigSnapshot> {
    let mut out = ConfigSnapshot::default();

    let newer = |section: Section| {
        if frontend.section_updated_at(section) > admin.section_updated_at(section) {
            frontend
        } else {
            admin
        }
    };
    out.quiz.updated_at = newer(Section::Quiz).quiz.updated_at;
    out.quiz.version = newer(Section::Quiz).quiz.version.clone();
    out.rewards.updated_at = newer(Section::Rewards).rewards.updated_at;
    out.rewards.version = newer(Section::Rewards).rewards.version.clone();
    out.settings.updated_at = newer(Section::Settings).settings.updated_at;
    out.settings.version = newer(Section::Settings).settings.version.clone();

    let order = |a: &[&str], f: &[&str]| -> Vec<String> {
        let mut ids: Vec<String> = a.iter().map(|s| s.to_string()).collect();
        for id in f {
            if !a.contains(id) {
                ids.push(id.to_string());
            }
        }
        ids
    };

    let ids = order(
        &admin.quiz.questions.iter().map(Keyed::key).collect::<Vec<_>>(),
        &frontend
            .quiz
            .questions
            .iter()
            .map(Keyed::key)
            .collect::<Vec<_>>(),
    );
    out.quiz.questions = collect_keyed(values, QUESTIONS, &ids)?;

    let ids = order(
        &admin.quiz.categories.iter().map(Keyed::key).collect::<Vec<_>>(),
        &frontend
            .quiz
            .categories
            .iter()
            .map(Keyed::key)
            .collect::<Vec<_>>(),
    );
    out.quiz.categories = collect_keyed(values, CATEGORIES, &ids)?;

    let ids = order(
        &admin
            .rewards
            .achievements
            .iter()
            .map(Keyed::key)
            .collect::<Vec<_>>(),
        &frontend
            .rewards
            .achievements
            .iter()
            .map(Keyed::key)
            .collect::<Vec<_>>(),
    );
    out.rewards.achievements = collect_keyed(values, ACHIEVEMENTS, &ids)?;

    if let Some(settings) = values.get(QUIZ_SETTINGS) {
        out.quiz.settings = settings.clone();
    }
    if let Some(popup) = values.get(POPUP_SETTINGS) {
        out.rewards.popup_settings = popup.clone();
    }

    let coins: Map<String, Value> = with_prefix(values, COIN_VALUES)
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    out.rewards.coin_values = serde_json::from_value(Value::Object(coins))?;

    out.settings.config_values = with_prefix(values, CONFIG_VALUES)
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    out.settings.feature_flags = with_prefix(values, FEATURE_FLAGS)
        .filter_map(|(key, value)| value.as_bool().map(|b| (key.to_string(), b)))
        .collect();

    Ok(out)
}

fn with_prefix<'a>(
    values: &'a BTreeMap<String, Value>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
    values
        .iter()
        .filter_map(move |(path, value)| path.strip_prefix(prefix).map(|key| (key, value)))
}

fn collect_keyed<T: DeserializeOwned>(
    values: &BTreeMap<String, Value>,
    prefix: &str,
    order: &[String],
) -> Result<Vec<T>> {
    let mut seen = BTreeSet::new();
    let mut items = Vec::new();

    for id in order {
        if let Some(value) = values.get(&format!("{}{}", prefix, id)) {
            seen.insert(id.as_str());
            items.push(serde_json::from_value(value.clone())?);
        }
    }
    // values chosen explicitly for ids neither side lists in its own order
    for (id, value) in with_prefix(values, prefix) {
        if !seen.contains(id) {
            items.push(serde_json::from_value(value.clone())?);
        }
    }

    Ok(items)
}
