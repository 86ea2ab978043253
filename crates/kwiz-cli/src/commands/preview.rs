//! Preview command implementation

use crate::commands::render;
use crate::context::SyncContext;
use crate::error::Result;

/// Run the preview command. Nothing is written.
pub fn run_preview(ctx: &SyncContext, operation: &str, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let preview = engine.generate_sync_preview(operation)?;

    if json {
        render::print_json(&preview)
    } else {
        render::print_preview(&preview);
        Ok(())
    }
}
