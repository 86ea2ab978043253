//! Snapshot stores: the admin and frontend sides of a sync
//!
//! The engine only ever talks to a store through [`SnapshotStore`]. How the
//! snapshot is persisted (memory, a JSON file, a remote API) is up to the
//! implementation, as long as `write` is all-or-nothing.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::{ConfigSnapshot, SnapshotPatch};

/// Which side of the sync a store represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreSide {
    /// Configuration authored in the admin dashboard
    Admin,
    /// Live configuration consumed by the quiz front end
    Frontend,
}

impl StoreSide {
    pub fn other(self) -> Self {
        match self {
            Self::Admin => Self::Frontend,
            Self::Frontend => Self::Admin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write contract for one side's configuration
pub trait SnapshotStore: Send + Sync {
    /// Which side this store holds
    fn side(&self) -> StoreSide;

    /// Read the current full snapshot
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store cannot be read.
    fn read(&self) -> Result<ConfigSnapshot>;

    /// Atomically replace the sections present in `patch`.
    ///
    /// Either every section in the patch is written or none is.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store cannot be written.
    fn write(&self, patch: &SnapshotPatch) -> Result<()>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn side(&self) -> StoreSide {
        (**self).side()
    }

    fn read(&self) -> Result<ConfigSnapshot> {
        (**self).read()
    }

    fn write(&self, patch: &SnapshotPatch) -> Result<()> {
        (**self).write(patch)
    }
}
