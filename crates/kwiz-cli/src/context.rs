//! Store and history locations, and engine construction
//!
//! Paths given on the command line (or through `KWIZ_SYNC_*` variables) win.
//! Anything left unset lives under the per-user data directory, for example
//! `~/.local/share/techkwiz-sync/` on Linux.

use std::path::{Path, PathBuf};

use kwiz_core::{EngineConfig, FileStore, StoreSide, SyncEngine};

use crate::cli::Cli;
use crate::error::{CliError, Result};

const DATA_DIR_NAME: &str = "techkwiz-sync";
const ADMIN_FILE: &str = "admin.json";
const FRONTEND_FILE: &str = "frontend.json";
const HISTORY_FILE: &str = "history.json";

/// Resolved file locations for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub admin: PathBuf,
    pub frontend: PathBuf,
    pub history: PathBuf,
    pub config: Option<PathBuf>,
}

impl SyncContext {
    /// Resolve paths from the parsed arguments
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::resolve(
            cli.admin.clone(),
            cli.frontend.clone(),
            cli.history.clone(),
            cli.config.clone(),
            dirs::data_dir().map(|d| d.join(DATA_DIR_NAME)),
        )
    }

    fn resolve(
        admin: Option<PathBuf>,
        frontend: Option<PathBuf>,
        history: Option<PathBuf>,
        config: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let default = |name: &str| -> Result<PathBuf> {
            data_dir.as_ref().map(|d| d.join(name)).ok_or_else(|| {
                CliError::user(format!(
                    "Cannot determine a data directory for {}; pass --admin, --frontend and --history",
                    name
                ))
            })
        };

        Ok(Self {
            admin: admin.map_or_else(|| default(ADMIN_FILE), Ok)?,
            frontend: frontend.map_or_else(|| default(FRONTEND_FILE), Ok)?,
            history: history.map_or_else(|| default(HISTORY_FILE), Ok)?,
            config,
        })
    }

    /// Load the engine configuration, or defaults when no file was given
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => Ok(EngineConfig::load(path)?),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Build an engine over the two store files with persistent history
    pub fn engine(&self) -> Result<SyncEngine> {
        let config = self.engine_config()?;
        tracing::debug!(
            admin = %self.admin.display(),
            frontend = %self.frontend.display(),
            history = %self.history.display(),
            "Opening sync engine"
        );

        let engine = SyncEngine::new(
            Box::new(FileStore::new(StoreSide::Admin, &self.admin)),
            Box::new(FileStore::new(StoreSide::Frontend, &self.frontend)),
            config,
        )?
        .with_history_file(&self.history)?;
        Ok(engine)
    }

    pub fn path_of(&self, side: StoreSide) -> &Path {
        match side {
            StoreSide::Admin => &self.admin,
            StoreSide::Frontend => &self.frontend,
        }
    }
}
