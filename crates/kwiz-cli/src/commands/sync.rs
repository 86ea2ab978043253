//! Sync command implementation
//!
//! Generates a preview, applies `--resolve` choices to it and executes it.
//! Unresolved manual conflicts stop the command before anything is written.

use colored::Colorize;
use kwiz_core::{ConflictChoice, SyncPreview};

use crate::commands::render;
use crate::context::SyncContext;
use crate::error::{CliError, Result};

/// Split `FIELD=SIDE` at the last `=`, since field paths never contain one
pub fn parse_resolution(raw: &str) -> Result<(String, ConflictChoice)> {
    let (field, side) = raw.rsplit_once('=').ok_or_else(|| {
        CliError::user(format!(
            "Invalid resolution '{}': expected FIELD=admin or FIELD=frontend",
            raw
        ))
    })?;
    if field.is_empty() {
        return Err(CliError::user(format!(
            "Invalid resolution '{}': missing field",
            raw
        )));
    }
    Ok((field.to_string(), side.parse()?))
}

fn apply_resolutions(preview: &mut SyncPreview, resolutions: &[String]) -> Result<()> {
    for raw in resolutions {
        let (field, choice) = parse_resolution(raw)?;
        preview.resolve_conflict(&field, choice)?;
        tracing::debug!(field = %field, "Applied conflict resolution");
    }
    Ok(())
}

/// Run the sync command
pub fn run_sync(
    ctx: &SyncContext,
    operation: &str,
    resolutions: &[String],
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let engine = ctx.engine()?;
    let mut preview = engine.generate_sync_preview(operation)?;
    apply_resolutions(&mut preview, resolutions)?;

    if dry_run {
        if json {
            return render::print_json(&preview);
        }
        render::print_preview(&preview);
        println!();
        println!("{} Dry run: nothing was written.", "NOTE".cyan().bold());
        return Ok(());
    }

    let blocking = preview.blocking_fields();
    if !blocking.is_empty() {
        if !json {
            render::print_conflicts(&preview.conflicts);
        }
        return Err(CliError::user(format!(
            "Manual resolution required for: {}. Re-run with --resolve FIELD=admin|frontend",
            blocking.join(", ")
        )));
    }

    if !json {
        println!(
            "{} Running {} sync...",
            "=>".blue().bold(),
            preview.operation.op_type
        );
    }

    let outcome = engine.execute_sync_operation(&preview);
    if json {
        render::print_json(&outcome)?;
    } else if outcome.success {
        println!("{} {}", "OK".green().bold(), outcome.message);
        if let Some(operation) = &outcome.operation {
            render::print_changes(&operation.changes);
            println!(
                "   {} undo with {}",
                "i".dimmed(),
                "kwiz-sync undo".cyan()
            );
        }
    }

    if outcome.success {
        Ok(())
    } else {
        Err(CliError::user(outcome.message))
    }
}
