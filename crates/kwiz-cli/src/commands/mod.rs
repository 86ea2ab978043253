//! Command implementations for kwiz-cli

pub mod history;
pub mod preview;
pub mod render;
pub mod status;
pub mod sync;

pub use history::{run_history, run_rollback, run_undo};
pub use preview::run_preview;
pub use status::run_status;
pub use sync::run_sync;
