//! Sync previews, execution and the engine service

mod engine;
mod listener;
mod plan;
mod preview;

pub use engine::{EngineStatus, SyncEngine, SyncOutcome};
pub use listener::{ListenerId, SyncEvent, SyncListener};
pub use preview::{DataFreshness, FreshnessReport, PreviewSummary, SyncPreview};
