//! Sync operations and their lifecycle

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::{ChangeItem, RiskLevel};
use crate::store::StoreSide;
use crate::{Error, Result};

/// The four sync strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    /// Frontend changes are copied into the admin store
    Pull,
    /// Admin changes are copied into the frontend store
    Push,
    /// Both sides are merged against the last synced state
    Smart,
    /// The frontend is overwritten with the full admin snapshot
    Reset,
}

impl OperationType {
    pub const ALL: [OperationType; 4] = [Self::Pull, Self::Push, Self::Smart, Self::Reset];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Smart => "smart",
            Self::Reset => "reset",
        }
    }

    pub fn direction(self) -> SyncDirection {
        match self {
            Self::Pull => SyncDirection::FrontendToAdmin,
            Self::Push | Self::Reset => SyncDirection::AdminToFrontend,
            Self::Smart => SyncDirection::Bidirectional,
        }
    }

    /// Store written by a one-directional operation; `None` for smart
    pub fn target(self) -> Option<StoreSide> {
        match self {
            Self::Pull => Some(StoreSide::Admin),
            Self::Push | Self::Reset => Some(StoreSide::Frontend),
            Self::Smart => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "unknown operation type '{}' (expected pull, push, smart or reset)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncDirection {
    AdminToFrontend,
    FrontendToAdmin,
    Bidirectional,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AdminToFrontend => "admin -> frontend",
            Self::FrontendToAdmin => "frontend -> admin",
            Self::Bidirectional => "admin <-> frontend",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    Pending,
    Completed,
    Failed,
    RolledBack,
}

impl OperationStatus {
    /// Allowed moves: pending to completed or failed, completed to rolled back
    pub fn can_transition_to(self, next: OperationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Completed, Self::RolledBack)
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RolledBack => "rolledBack",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Milliseconds. An estimate while pending, measured once executed.
    pub duration: u64,
    /// Bytes of snapshot data involved
    pub data_size: u64,
    pub conflicts_resolved: usize,
}

/// One sync attempt, from preview to its final status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub direction: SyncDirection,
    pub timestamp: DateTime<Utc>,
    pub status: OperationStatus,
    pub changes: Vec<ChangeItem>,
    pub risk_level: RiskLevel,
    pub performance_metrics: PerformanceMetrics,
    /// Points captured before this operation wrote anything
    #[serde(default)]
    pub rollback_point_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOperation {
    /// A pending operation; its risk is the highest risk among `changes`
    pub fn pending(op_type: OperationType, changes: Vec<ChangeItem>) -> Self {
        let risk_level = changes
            .iter()
            .map(|c| c.risk_level)
            .max()
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            op_type,
            direction: op_type.direction(),
            timestamp: Utc::now(),
            status: OperationStatus::Pending,
            changes,
            risk_level,
            performance_metrics: PerformanceMetrics::default(),
            rollback_point_ids: Vec::new(),
            error: None,
        }
    }

    /// Move to `next`, rejecting anything outside the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a disallowed transition.
    pub fn transition(&mut self, next: OperationStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::validation(format!(
                "operation {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeAction, ChangeCategory, ChangeDetails};
    use rstest::rstest;

    fn change(risk: RiskLevel) -> ChangeItem {
        ChangeItem {
            category: ChangeCategory::Quiz,
            field: "questions".into(),
            action: ChangeAction::Add,
            risk_level: risk,
            impact: String::new(),
            target: StoreSide::Frontend,
            details: ChangeDetails::Entries { items: vec![] },
        }
    }

    #[rstest]
    #[case("pull", OperationType::Pull)]
    #[case("push", OperationType::Push)]
    #[case("smart", OperationType::Smart)]
    #[case("reset", OperationType::Reset)]
    fn parses_known_operation_types(#[case] input: &str, #[case] expected: OperationType) {
        assert_eq!(input.parse::<OperationType>().unwrap(), expected);
    }

    #[rstest]
    #[case("merge")]
    #[case("PUSH")]
    #[case("")]
    fn rejects_unknown_operation_types(#[case] input: &str) {
        assert!(matches!(
            input.parse::<OperationType>(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn pending_risk_is_maximum_of_changes() {
        let op = SyncOperation::pending(
            OperationType::Push,
            vec![change(RiskLevel::Safe), change(RiskLevel::Caution)],
        );
        assert_eq!(op.risk_level, RiskLevel::Caution);
        assert_eq!(op.status, OperationStatus::Pending);
        assert_eq!(op.direction, SyncDirection::AdminToFrontend);
    }

    #[test]
    fn empty_operation_is_safe() {
        let op = SyncOperation::pending(OperationType::Reset, vec![]);
        assert_eq!(op.risk_level, RiskLevel::Safe);
    }

    #[rstest]
    #[case(OperationStatus::Pending, OperationStatus::Completed, true)]
    #[case(OperationStatus::Pending, OperationStatus::Failed, true)]
    #[case(OperationStatus::Completed, OperationStatus::RolledBack, true)]
    #[case(OperationStatus::Failed, OperationStatus::Completed, false)]
    #[case(OperationStatus::RolledBack, OperationStatus::Completed, false)]
    #[case(OperationStatus::Pending, OperationStatus::RolledBack, false)]
    fn status_transitions(
        #[case] from: OperationStatus,
        #[case] to: OperationStatus,
        #[case] allowed: bool,
    ) {
        let mut op = SyncOperation::pending(OperationType::Pull, vec![]);
        op.status = from;
        assert_eq!(op.transition(to).is_ok(), allowed);
        assert_eq!(op.status, if allowed { to } else { from });
    }

    #[test]
    fn serializes_type_field() {
        let op = SyncOperation::pending(OperationType::Smart, vec![]);
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "smart");
        assert_eq!(value["direction"], "bidirectional");
        assert!(value.get("error").is_none());
    }
}
