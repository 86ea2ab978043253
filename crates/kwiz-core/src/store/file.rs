//! JSON-file snapshot store

use std::path::{Path, PathBuf};

use kwiz_fs::{RobustnessConfig, io};

use super::{SnapshotStore, StoreSide};
use crate::model::{ConfigSnapshot, SnapshotPatch};
use crate::{Error, Result};

/// A snapshot persisted as one pretty-printed JSON document.
///
/// A missing file reads as an empty snapshot so a fresh install can sync
/// into it. A file that exists but does not parse is reported as
/// unavailable rather than silently replaced.
#[derive(Debug, Clone)]
pub struct FileStore {
    side: StoreSide,
    path: PathBuf,
    robustness: RobustnessConfig,
}

impl FileStore {
    pub fn new(side: StoreSide, path: impl Into<PathBuf>) -> Self {
        Self {
            side,
            path: path.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, action: &str, err: impl std::fmt::Display) -> Error {
        Error::store(
            self.side,
            format!("failed to {} {}: {}", action, self.path.display(), err),
        )
    }
}

impl SnapshotStore for FileStore {
    fn side(&self) -> StoreSide {
        self.side
    }

    fn read(&self) -> Result<ConfigSnapshot> {
        if !self.path.exists() {
            tracing::debug!(side = %self.side, path = %self.path.display(), "Store file missing, using empty snapshot");
            return Ok(ConfigSnapshot::default());
        }

        let content = io::read_text_locked(&self.path, self.robustness)
            .map_err(|e| self.unavailable("read", e))?;
        serde_json::from_str(&content).map_err(|e| self.unavailable("parse", e))
    }

    fn write(&self, patch: &SnapshotPatch) -> Result<()> {
        let mut snapshot = self.read()?;
        snapshot.apply(patch);

        let content = serde_json::to_vec_pretty(&snapshot)?;
        io::write_atomic(&self.path, &content, self.robustness)
            .map_err(|e| self.unavailable("write", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuizQuestion, Section};
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_default() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(StoreSide::Frontend, dir.path().join("frontend.json"));
        assert_eq!(store.read().unwrap(), ConfigSnapshot::default());
    }

    #[test]
    fn write_then_read_round_trips_patch() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(StoreSide::Admin, dir.path().join("admin.json"));

        let mut source = ConfigSnapshot::default();
        source
            .quiz
            .questions
            .push(QuizQuestion::new("q1", "?", vec!["a".into()], 0));
        store
            .write(&source.patch_for(&[Section::Quiz].into_iter().collect()))
            .unwrap();

        let read = store.read().unwrap();
        assert_eq!(read.quiz.questions.len(), 1);
        assert_eq!(read.rewards, source.rewards);
    }

    #[test]
    fn corrupt_file_is_store_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frontend.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = FileStore::new(StoreSide::Frontend, &path).read().unwrap_err();
        assert!(matches!(
            err,
            Error::StoreUnavailable {
                side: StoreSide::Frontend,
                ..
            }
        ));
    }
}
