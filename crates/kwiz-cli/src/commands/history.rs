//! History, undo and rollback command implementations

use colored::Colorize;
use uuid::Uuid;

use crate::commands::render;
use crate::context::SyncContext;
use crate::error::{CliError, Result};

/// Run the history command
pub fn run_history(ctx: &SyncContext, limit: usize, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let history = engine.get_sync_history();
    let recent: Vec<_> = history.recent(limit).collect();

    if json {
        return render::print_json(&recent);
    }

    println!("{}", "Sync History".bold());
    println!();
    if recent.is_empty() {
        println!("  {} (use {} to run one)", "No operations".dimmed(), "kwiz-sync sync".cyan());
        return Ok(());
    }

    for operation in &recent {
        render::print_operation(operation);
    }

    println!();
    println!("{}:", "Rollback Points".bold());
    if history.rollback_points().is_empty() {
        println!("  {}", "None".dimmed());
    }
    for point in history.rollback_points().iter().rev() {
        println!(
            "   {} {} {} ({})",
            point.id.to_string().cyan(),
            point.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            point.description,
            point.target
        );
    }
    Ok(())
}

/// Run the undo command
pub fn run_undo(ctx: &SyncContext) -> Result<()> {
    let engine = ctx.engine()?;
    println!("{} Undoing last sync...", "=>".blue().bold());

    let outcome = engine.undo_last_sync();
    if !outcome.success {
        return Err(CliError::user(outcome.message));
    }
    println!("{} {}", "OK".green().bold(), outcome.message);
    Ok(())
}

/// Run the rollback command
pub fn run_rollback(ctx: &SyncContext, id: &str) -> Result<()> {
    let id: Uuid = id
        .parse()
        .map_err(|_| CliError::user(format!("Invalid rollback point id '{}'", id)))?;

    let engine = ctx.engine()?;
    println!("{} Restoring rollback point {}...", "=>".blue().bold(), id);

    let outcome = engine.rollback_to_point(id);
    if !outcome.success {
        return Err(CliError::user(outcome.message));
    }
    println!("{} {}", "OK".green().bold(), outcome.message);
    Ok(())
}
