//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// kwiz-sync - Keep the TechKwiz admin and frontend configuration in step
#[derive(Parser, Debug)]
#[command(name = "kwiz-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "KWIZ_SYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Admin store file
    #[arg(long, global = true, env = "KWIZ_SYNC_ADMIN", value_name = "FILE")]
    pub admin: Option<PathBuf>,

    /// Frontend store file
    #[arg(long, global = true, env = "KWIZ_SYNC_FRONTEND", value_name = "FILE")]
    pub frontend: Option<PathBuf>,

    /// Sync history file
    #[arg(long, global = true, env = "KWIZ_SYNC_HISTORY", value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Preview what an operation would change
    ///
    /// Operations: pull (frontend to admin), push (admin to frontend),
    /// smart (merge both ways) and reset (overwrite frontend with admin).
    Preview {
        /// pull, push, smart or reset
        operation: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Run a sync operation
    ///
    /// Examples:
    ///   kwiz-sync sync push
    ///   kwiz-sync sync smart --resolve rewards.coinValues.correct=admin
    ///   kwiz-sync sync reset --dry-run
    Sync {
        /// pull, push, smart or reset
        operation: String,

        /// Resolve a manual conflict, as FIELD=admin or FIELD=frontend
        #[arg(long = "resolve", value_name = "FIELD=SIDE")]
        resolutions: Vec<String>,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show recent sync operations
    History {
        /// Number of operations to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Undo the most recent completed sync
    Undo,

    /// Restore a store to a rollback point
    Rollback {
        /// Rollback point id (see `kwiz-sync history`)
        id: String,
    },

    /// Show sync status overview
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_with_resolutions() {
        let cli = Cli::try_parse_from([
            "kwiz-sync",
            "sync",
            "smart",
            "--resolve",
            "rewards.coinValues.correct=admin",
            "--resolve",
            "quiz.settings=frontend",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Sync {
                operation: "smart".into(),
                resolutions: vec![
                    "rewards.coinValues.correct=admin".into(),
                    "quiz.settings=frontend".into()
                ],
                dry_run: true,
                json: false,
            })
        );
    }

    #[test]
    fn global_paths_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "kwiz-sync",
            "status",
            "--admin",
            "a.json",
            "--frontend",
            "f.json",
        ])
        .unwrap();

        assert_eq!(cli.admin, Some(PathBuf::from("a.json")));
        assert_eq!(cli.frontend, Some(PathBuf::from("f.json")));
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["kwiz-sync", "history"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::History {
                limit: 10,
                json: false
            })
        );
    }

    #[test]
    fn rollback_requires_an_id() {
        assert!(Cli::try_parse_from(["kwiz-sync", "rollback"]).is_err());
    }
}
