//! Bidirectional configuration sync for TechKwiz
//!
//! The admin dashboard and the quiz front end each keep their own copy of
//! the quiz configuration. This crate keeps the two in step:
//!
//! - **Diff engine**: compares two snapshots and classifies every change by risk
//! - **Conflict classifier**: finds fields both sides changed since the last sync
//! - **Sync executor**: applies pull, push, smart and reset operations
//! - **History ledger**: records operations and rollback points, with undo
//!
//! # Architecture
//!
//! ```text
//!                 kwiz-cli / UI
//!                       |
//!                  SyncEngine
//!                       |
//!     +--------+--------+---------+---------+
//!     |        |        |         |         |
//!   diff   conflict  history    store    config
//!                       |         |
//!                    kwiz-fs   kwiz-fs
//! ```
//!
//! # Example
//!
//! ```
//! use kwiz_core::{EngineConfig, MemoryStore, StoreSide, SyncEngine};
//!
//! fn example() -> kwiz_core::Result<()> {
//!     let engine = SyncEngine::new(
//!         Box::new(MemoryStore::empty(StoreSide::Admin)),
//!         Box::new(MemoryStore::empty(StoreSide::Frontend)),
//!         EngineConfig::default(),
//!     )?;
//!
//!     let preview = engine.generate_sync_preview("push")?;
//!     let outcome = engine.execute_sync_operation(&preview);
//!     assert!(outcome.success);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod config;
pub mod conflict;
pub mod diff;
pub mod error;
pub mod history;
pub mod model;
pub mod store;
pub mod sync;

pub use config::{EngineConfig, EstimateConfig, FreshnessConfig, RetentionConfig};
pub use conflict::{ConflictChoice, ConflictResolution, Resolution, detect_conflicts};
pub use diff::{
    ChangeAction, ChangeCategory, ChangeDetails, ChangeItem, FieldChange, RiskLevel,
    detect_changes,
};
pub use error::{Error, Result};
pub use history::{
    OperationStatus, OperationType, PerformanceMetrics, RollbackPoint, SyncDirection,
    SyncHistory, SyncOperation,
};
pub use model::{
    Achievement, CoinValues, ConfigSnapshot, QuizCategory, QuizQuestion, Section, SnapshotPatch,
};
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreSide};
pub use sync::{
    DataFreshness, EngineStatus, ListenerId, PreviewSummary, SyncEngine, SyncEvent, SyncOutcome,
    SyncPreview,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_side() {
        let error = Error::store(StoreSide::Frontend, "disk full");
        assert_eq!(error.to_string(), "frontend store unavailable: disk full");
    }

    #[test]
    fn conflict_blocked_lists_fields() {
        let error = Error::ConflictBlocked {
            fields: vec!["a".into(), "b".into()],
        };
        assert_eq!(error.to_string(), "Manual resolution required for: a, b");
    }
}
