//! Status command implementation

use colored::Colorize;
use kwiz_core::StoreSide;
use serde::Serialize;

use crate::commands::render;
use crate::context::SyncContext;
use crate::error::Result;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    admin_path: &'a std::path::Path,
    frontend_path: &'a std::path::Path,
    history_path: &'a std::path::Path,
    #[serde(flatten)]
    status: kwiz_core::EngineStatus,
}

/// Run the status command
pub fn run_status(ctx: &SyncContext, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let status = engine.status();

    if json {
        return render::print_json(&StatusReport {
            admin_path: &ctx.admin,
            frontend_path: &ctx.frontend,
            history_path: &ctx.history,
            status,
        });
    }

    println!("{}", "Sync Status".bold());
    println!();
    for side in [StoreSide::Admin, StoreSide::Frontend] {
        let path = ctx.path_of(side);
        let state = if path.exists() {
            "present".green()
        } else {
            "missing (reads as empty)".yellow()
        };
        println!("{}: {} ({})", side.to_string().dimmed(), path.display(), state);
    }
    println!("{}: {}", "history".dimmed(), ctx.history.display());
    println!();

    println!("{}:   {}", "Operations".dimmed(), status.operation_count);
    println!("{}:   {}", "Rollback points".dimmed(), status.rollback_point_count);
    let ancestor = if status.has_ancestor {
        "yes".green()
    } else {
        "no (smart sync will ask about every difference)".yellow()
    };
    println!("{}:   {}", "Synced baseline".dimmed(), ancestor);
    println!();

    println!("{}:", "Last Operation".bold());
    match &status.last_operation {
        Some(operation) => render::print_operation(operation),
        None => println!("  {}", "None".dimmed()),
    }
    Ok(())
}
