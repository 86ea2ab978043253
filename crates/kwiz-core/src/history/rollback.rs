//! Pre-write captures of a store's state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ConfigSnapshot;
use crate::store::StoreSide;

/// Snapshot of one store taken immediately before a sync wrote to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackPoint {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Store this point restores
    pub target: StoreSide,
    pub config_snapshot: ConfigSnapshot,
    /// Last synced state at capture time, restored alongside the store
    #[serde(default)]
    pub ancestor: Option<ConfigSnapshot>,
}

impl RollbackPoint {
    pub fn capture(
        target: StoreSide,
        config_snapshot: ConfigSnapshot,
        ancestor: Option<ConfigSnapshot>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            description: description.into(),
            target,
            config_snapshot,
            ancestor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_generates_id_and_timestamp() {
        let point = RollbackPoint::capture(
            StoreSide::Frontend,
            ConfigSnapshot::default(),
            None,
            "Before push",
        );

        assert!(!point.id.is_nil());
        let age = Utc::now().signed_duration_since(point.timestamp);
        assert!(age.num_seconds() < 60);
        assert_eq!(point.target, StoreSide::Frontend);
    }
}
