//! Sync previews: what an operation would do, before it does it

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FreshnessConfig;
use crate::conflict::{ConflictChoice, ConflictResolution};
use crate::diff::{ChangeItem, RiskLevel};
use crate::history::SyncOperation;
use crate::model::ConfigSnapshot;
use crate::{Error, Result};

/// How recently a store's data was modified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataFreshness {
    Fresh,
    Stale,
    Outdated,
}

impl DataFreshness {
    pub fn classify(
        updated_at: DateTime<Utc>,
        now: DateTime<Utc>,
        thresholds: &FreshnessConfig,
    ) -> Self {
        let age = now
            .signed_duration_since(updated_at)
            .to_std()
            .unwrap_or_default();
        if age < thresholds.fresh() {
            Self::Fresh
        } else if age < thresholds.stale() {
            Self::Stale
        } else {
            Self::Outdated
        }
    }
}

impl fmt::Display for DataFreshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Outdated => "outdated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessReport {
    pub admin: DataFreshness,
    pub frontend: DataFreshness,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub total_changes: usize,
    pub safe_changes: usize,
    pub caution_changes: usize,
    pub destructive_changes: usize,
    /// Heuristic estimate in milliseconds
    pub estimated_duration: u64,
}

impl PreviewSummary {
    pub fn from_changes(changes: &[ChangeItem], estimated_duration: u64) -> Self {
        let count = |level: RiskLevel| changes.iter().filter(|c| c.risk_level == level).count();
        Self {
            total_changes: changes.len(),
            safe_changes: count(RiskLevel::Safe),
            caution_changes: count(RiskLevel::Caution),
            destructive_changes: count(RiskLevel::Destructive),
            estimated_duration,
        }
    }
}

/// Everything a caller needs to review and confirm a sync.
///
/// The fingerprints pin the store contents the preview was computed from;
/// executing a preview after either store changed is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPreview {
    pub operation: SyncOperation,
    pub conflicts: Vec<ConflictResolution>,
    pub summary: PreviewSummary,
    pub data_freshness: FreshnessReport,
    pub frontend_data: ConfigSnapshot,
    pub admin_fingerprint: String,
    pub frontend_fingerprint: String,
}

impl SyncPreview {
    /// Fields whose conflicts still need a manual decision
    pub fn blocking_fields(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .filter(|c| c.is_blocking())
            .map(|c| c.field.clone())
            .collect()
    }

    pub fn has_blocking_conflicts(&self) -> bool {
        self.conflicts.iter().any(ConflictResolution::is_blocking)
    }

    /// Settle one conflict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no conflict exists for `field`.
    pub fn resolve_conflict(&mut self, field: &str, choice: ConflictChoice) -> Result<()> {
        let conflict = self
            .conflicts
            .iter_mut()
            .find(|c| c.field == field)
            .ok_or_else(|| Error::NotFound(format!("conflict for field '{}'", field)))?;
        conflict.resolve(choice);
        Ok(())
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.operation.risk_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(0, DataFreshness::Fresh)]
    #[case(4 * 60, DataFreshness::Fresh)]
    #[case(5 * 60, DataFreshness::Stale)]
    #[case(29 * 60, DataFreshness::Stale)]
    #[case(30 * 60, DataFreshness::Outdated)]
    #[case(-60, DataFreshness::Fresh)]
    fn freshness_thresholds(#[case] age_secs: i64, #[case] expected: DataFreshness) {
        let now = Utc::now();
        let updated = now - Duration::seconds(age_secs);
        assert_eq!(
            DataFreshness::classify(updated, now, &FreshnessConfig::default()),
            expected
        );
    }

    #[test]
    fn summary_counts_by_risk() {
        use crate::diff::{ChangeAction, ChangeCategory, ChangeDetails};
        use crate::store::StoreSide;

        let item = |risk| ChangeItem {
            category: ChangeCategory::Quiz,
            field: "questions".into(),
            action: ChangeAction::Add,
            risk_level: risk,
            impact: String::new(),
            target: StoreSide::Frontend,
            details: ChangeDetails::Entries { items: vec![] },
        };
        let changes = vec![
            item(RiskLevel::Safe),
            item(RiskLevel::Safe),
            item(RiskLevel::Destructive),
        ];

        let summary = PreviewSummary::from_changes(&changes, 250);
        assert_eq!(summary.total_changes, 3);
        assert_eq!(summary.safe_changes, 2);
        assert_eq!(summary.caution_changes, 0);
        assert_eq!(summary.destructive_changes, 1);
        assert_eq!(summary.estimated_duration, 250);
    }
}
