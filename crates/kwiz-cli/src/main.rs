//! kwiz-sync CLI
//!
//! Command-line front end for previewing, running and undoing syncs between
//! the TechKwiz admin and frontend configuration stores.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::SyncContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let Some(command) = cli.command.clone() else {
        println!("{} TechKwiz config sync", "kwiz-sync".green().bold());
        println!();
        println!("Run {} for available commands.", "kwiz-sync --help".cyan());
        return Ok(());
    };

    let ctx = SyncContext::from_cli(&cli)?;
    execute_command(&ctx, command)
}

fn execute_command(ctx: &SyncContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Preview { operation, json } => commands::run_preview(ctx, &operation, json),
        Commands::Sync {
            operation,
            resolutions,
            dry_run,
            json,
        } => commands::run_sync(ctx, &operation, &resolutions, dry_run, json),
        Commands::History { limit, json } => commands::run_history(ctx, limit, json),
        Commands::Undo => commands::run_undo(ctx),
        Commands::Rollback { id } => commands::run_rollback(ctx, &id),
        Commands::Status { json } => commands::run_status(ctx, json),
    }
}
