//! In-process snapshot store

use std::sync::{PoisonError, RwLock};

use super::{SnapshotStore, StoreSide};
use crate::Result;
use crate::model::{ConfigSnapshot, SnapshotPatch};

/// A snapshot held in memory behind a lock.
///
/// Useful for embedding the engine next to another persistence layer and
/// for tests, where [`MemoryStore::update`] simulates edits made by the
/// admin dashboard or the front end.
#[derive(Debug)]
pub struct MemoryStore {
    side: StoreSide,
    snapshot: RwLock<ConfigSnapshot>,
}

impl MemoryStore {
    pub fn new(side: StoreSide, snapshot: ConfigSnapshot) -> Self {
        Self {
            side,
            snapshot: RwLock::new(snapshot),
        }
    }

    /// An empty store for the given side
    pub fn empty(side: StoreSide) -> Self {
        Self::new(side, ConfigSnapshot::default())
    }

    /// Current snapshot (a copy)
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the held snapshot directly, bypassing the sync engine
    pub fn update(&self, edit: impl FnOnce(&mut ConfigSnapshot)) {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        edit(&mut guard);
    }
}

impl SnapshotStore for MemoryStore {
    fn side(&self) -> StoreSide {
        self.side
    }

    fn read(&self) -> Result<ConfigSnapshot> {
        Ok(self.snapshot())
    }

    fn write(&self, patch: &SnapshotPatch) -> Result<()> {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.apply(patch);
        Ok(())
    }
}
