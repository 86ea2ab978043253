//! A snapshot store that fails on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kwiz_core::{ConfigSnapshot, Error, MemoryStore, Result, SnapshotPatch, SnapshotStore, StoreSide};

/// Wraps a [`MemoryStore`] and returns `StoreUnavailable` from `read` or
/// `write` while the matching switch is on. A failed write leaves the held
/// snapshot untouched.
#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FaultyStore {
    pub fn new(side: StoreSide, snapshot: ConfigSnapshot) -> Self {
        Self {
            inner: MemoryStore::new(side, snapshot),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current snapshot, regardless of the failure switches
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.inner.snapshot()
    }

    pub fn update(&self, edit: impl FnOnce(&mut ConfigSnapshot)) {
        self.inner.update(edit);
    }
}

impl SnapshotStore for FaultyStore {
    fn side(&self) -> StoreSide {
        self.inner.side()
    }

    fn read(&self) -> Result<ConfigSnapshot> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::store(self.side(), "injected read failure"));
        }
        self.inner.read()
    }

    fn write(&self, patch: &SnapshotPatch) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store(self.side(), "injected write failure"));
        }
        self.inner.write(patch)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
