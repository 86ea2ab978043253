//! [`SyncSandbox`]: file-backed admin/frontend stores in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use kwiz_core::{ConfigSnapshot, EngineConfig, FileStore, StoreSide, SyncEngine};
use tempfile::TempDir;

/// A temporary directory holding `admin.json`, `frontend.json` and
/// `history.json`, with helpers for seeding and inspecting them.
///
/// # Example
///
/// ```rust,no_run
/// use kwiz_test_utils::{SyncSandbox, fixtures};
///
/// let sandbox = SyncSandbox::new();
/// sandbox.write_admin(&fixtures::sample_snapshot());
/// let engine = sandbox.engine();
/// ```
pub struct SyncSandbox {
    temp_dir: TempDir,
}

impl Default for SyncSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSandbox {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("SyncSandbox::new: failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn admin_path(&self) -> PathBuf {
        self.root().join("admin.json")
    }

    pub fn frontend_path(&self) -> PathBuf {
        self.root().join("frontend.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.root().join("history.json")
    }

    pub fn write_admin(&self, snapshot: &ConfigSnapshot) {
        write_snapshot(&self.admin_path(), snapshot);
    }

    pub fn write_frontend(&self, snapshot: &ConfigSnapshot) {
        write_snapshot(&self.frontend_path(), snapshot);
    }

    pub fn read_admin(&self) -> ConfigSnapshot {
        read_snapshot(&self.admin_path())
    }

    pub fn read_frontend(&self) -> ConfigSnapshot {
        read_snapshot(&self.frontend_path())
    }

    /// An engine over the sandbox files, persisting history to `history.json`
    ///
    /// # Panics
    /// Panics if the engine cannot be built or the history cannot be loaded.
    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            Box::new(FileStore::new(StoreSide::Admin, self.admin_path())),
            Box::new(FileStore::new(StoreSide::Frontend, self.frontend_path())),
            EngineConfig::default(),
        )
        .and_then(|engine| engine.with_history_file(self.history_path()))
        .unwrap_or_else(|e| panic!("SyncSandbox::engine: {e}"))
    }
}

fn write_snapshot(path: &Path, snapshot: &ConfigSnapshot) {
    let content = serde_json::to_string_pretty(snapshot)
        .unwrap_or_else(|e| panic!("failed to serialize snapshot: {e}"));
    fs::write(path, content)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

fn read_snapshot(path: &Path) -> ConfigSnapshot {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}
