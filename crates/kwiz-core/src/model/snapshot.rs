//! Full configuration snapshots and partial patches

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::question::{QuizCategory, QuizQuestion};
use super::rewards::{Achievement, CoinValues};
use crate::{Error, Result};

const INITIAL_VERSION: &str = "1.0.0";

fn initial_version() -> String {
    INITIAL_VERSION.to_string()
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Top-level configuration sections; the unit of an atomic store write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Quiz,
    Rewards,
    Settings,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Quiz, Section::Rewards, Section::Settings];
}

/// Quiz questions, categories, and quiz-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSection {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub categories: Vec<QuizCategory>,
    #[serde(default = "empty_object")]
    pub settings: Value,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: String,
}

impl Default for QuizSection {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            categories: Vec::new(),
            settings: empty_object(),
            updated_at: DateTime::default(),
            version: initial_version(),
        }
    }
}

/// Reward rules: achievements, coin values, popup behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSection {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub coin_values: CoinValues,
    #[serde(default = "empty_object")]
    pub popup_settings: Value,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: String,
}

impl Default for RewardSection {
    fn default() -> Self {
        Self {
            achievements: Vec::new(),
            coin_values: CoinValues::default(),
            popup_settings: empty_object(),
            updated_at: DateTime::default(),
            version: initial_version(),
        }
    }
}

/// System settings and feature flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSection {
    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub config_values: BTreeMap<String, Value>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: String,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            feature_flags: BTreeMap::new(),
            config_values: BTreeMap::new(),
            updated_at: DateTime::default(),
            version: initial_version(),
        }
    }
}

/// A point-in-time capture of one side's full configuration.
///
/// Snapshots are values: the engine clones them out of a store, compares
/// them, and hands new ones back through [`SnapshotPatch`]. Nothing mutates
/// a store's snapshot in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub quiz: QuizSection,
    #[serde(default)]
    pub rewards: RewardSection,
    #[serde(default)]
    pub settings: SettingsSection,
}

impl ConfigSnapshot {
    /// Canonical `sha256:<hex>` fingerprint of the serialized snapshot.
    ///
    /// Map types are ordered, so equal snapshots always fingerprint equally.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(kwiz_fs::compute_content_checksum(bytes))
    }

    /// Size of the serialized snapshot in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }

    /// When a section was last modified
    pub fn section_updated_at(&self, section: Section) -> DateTime<Utc> {
        match section {
            Section::Quiz => self.quiz.updated_at,
            Section::Rewards => self.rewards.updated_at,
            Section::Settings => self.settings.updated_at,
        }
    }

    /// Most recent modification across all sections
    pub fn newest_update(&self) -> DateTime<Utc> {
        Section::ALL
            .iter()
            .map(|s| self.section_updated_at(*s))
            .max()
            .unwrap_or_default()
    }

    /// Whether one section is identical between two snapshots
    pub fn section_eq(&self, other: &ConfigSnapshot, section: Section) -> bool {
        match section {
            Section::Quiz => self.quiz == other.quiz,
            Section::Rewards => self.rewards == other.rewards,
            Section::Settings => self.settings == other.settings,
        }
    }

    /// Sections whose content differs from `other`
    pub fn differing_sections(&self, other: &ConfigSnapshot) -> BTreeSet<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| !self.section_eq(other, *s))
            .collect()
    }

    /// Build a patch carrying copies of the given sections
    pub fn patch_for(&self, sections: &BTreeSet<Section>) -> SnapshotPatch {
        SnapshotPatch {
            quiz: sections.contains(&Section::Quiz).then(|| self.quiz.clone()),
            rewards: sections
                .contains(&Section::Rewards)
                .then(|| self.rewards.clone()),
            settings: sections
                .contains(&Section::Settings)
                .then(|| self.settings.clone()),
        }
    }

    /// Build a patch replacing every section
    pub fn full_patch(&self) -> SnapshotPatch {
        self.patch_for(&Section::ALL.into_iter().collect())
    }

    /// Apply a patch, replacing whole sections
    pub fn apply(&mut self, patch: &SnapshotPatch) {
        if let Some(quiz) = &patch.quiz {
            self.quiz = quiz.clone();
        }
        if let Some(rewards) = &patch.rewards {
            self.rewards = rewards.clone();
        }
        if let Some(settings) = &patch.settings {
            self.settings = settings.clone();
        }
    }

    /// Check the snapshot against the reward and question rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every violation.
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.rewards.coin_values.violations();

        let mut seen = HashSet::new();
        for question in &self.quiz.questions {
            if !seen.insert(question.id.as_str()) {
                problems.push(format!("duplicate question id '{}'", question.id));
            }
            if question.correct_option().is_none() {
                problems.push(format!(
                    "question '{}' has correctAnswer {} but only {} options",
                    question.id,
                    question.correct_answer,
                    question.options.len()
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(problems.join("; ")))
        }
    }
}

/// A partial snapshot: each present section replaces the store's section wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<RewardSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsSection>,
}

impl SnapshotPatch {
    pub fn is_empty(&self) -> bool {
        self.quiz.is_none() && self.rewards.is_none() && self.settings.is_none()
    }

    /// Sections this patch replaces
    pub fn sections(&self) -> BTreeSet<Section> {
        let mut sections = BTreeSet::new();
        if self.quiz.is_some() {
            sections.insert(Section::Quiz);
        }
        if self.rewards.is_some() {
            sections.insert(Section::Rewards);
        }
        if self.settings.is_some() {
            sections.insert(Section::Settings);
        }
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn question(id: &str) -> QuizQuestion {
        QuizQuestion::new(id, "Q?", vec!["a".into(), "b".into()], 0)
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let mut a = ConfigSnapshot::default();
        a.quiz.questions.push(question("q1"));
        let b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let mut c = a.clone();
        c.rewards.coin_values.correct = 30;
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn patch_for_only_copies_requested_sections() {
        let snapshot = ConfigSnapshot::default();
        let patch = snapshot.patch_for(&[Section::Rewards].into_iter().collect());

        assert!(patch.quiz.is_none());
        assert!(patch.rewards.is_some());
        assert_eq!(patch.sections().len(), 1);
    }

    #[test]
    fn apply_replaces_whole_sections() {
        let mut target = ConfigSnapshot::default();
        target.quiz.questions.push(question("old"));

        let mut source = ConfigSnapshot::default();
        source.quiz.questions.push(question("new"));

        target.apply(&source.patch_for(&[Section::Quiz].into_iter().collect()));
        assert_eq!(target.quiz.questions.len(), 1);
        assert_eq!(target.quiz.questions[0].id, "new");
    }

    #[test]
    fn newest_update_takes_max_section() {
        let mut snapshot = ConfigSnapshot::default();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        snapshot.rewards.updated_at = later;
        assert_eq!(snapshot.newest_update(), later);
    }

    #[test]
    fn validate_reports_duplicate_ids_and_bad_answer_index() {
        let mut snapshot = ConfigSnapshot::default();
        snapshot.quiz.questions.push(question("dup"));
        snapshot.quiz.questions.push(question("dup"));
        snapshot
            .quiz
            .questions
            .push(QuizQuestion::new("bad", "?", vec!["only".into()], 4));

        let err = snapshot.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate question id 'dup'"));
        assert!(err.contains("question 'bad' has correctAnswer 4"));
    }

    #[test]
    fn empty_json_object_parses_to_default_snapshot() {
        let snapshot: ConfigSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, ConfigSnapshot::default());
    }
}
