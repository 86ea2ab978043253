//! Atomic I/O operations with file locking
//!
//! Writers take an exclusive advisory lock on a sidecar `.<name>.lock` file,
//! write to a temp file in the same directory, then rename over the target.
//! Readers take a shared lock on the same sidecar, so a reader never observes
//! a half-written file and two writers never interleave.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, Result};

/// Retry and durability settings for locked I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Total time spent retrying a busy lock before giving up
    pub lock_timeout: Duration,
    /// First backoff interval between lock attempts
    pub initial_backoff: Duration,
    /// Upper bound for a single backoff interval
    pub max_backoff: Duration,
    /// Flush the temp file to disk before the rename
    pub durable: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(500),
            durable: true,
        }
    }
}

/// Path of the sidecar lock file guarding `path`.
pub fn lock_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.lock", name))
}

/// Acquire an advisory lock for `path`, retrying with exponential backoff.
///
/// The lock is released when the returned handle is dropped.
fn acquire_lock(path: &Path, exclusive: bool, robustness: RobustnessConfig) -> Result<File> {
    let sidecar = lock_path(path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&sidecar)
        .map_err(|e| Error::io(&sidecar, e))?;

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(robustness.initial_backoff)
        .with_max_interval(robustness.max_backoff)
        .with_max_elapsed_time(Some(robustness.lock_timeout))
        .build();

    backoff::retry(policy, || {
        let attempt = if exclusive {
            FileExt::try_lock_exclusive(&file)
        } else {
            FileExt::try_lock_shared(&file)
        };
        attempt.map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    Ok(file)
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so the target either holds the old content
/// or the new content, never a mix.
pub fn write_atomic(path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock = acquire_lock(path, true, robustness)?;

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    if let Err(e) = temp_file.write_all(content) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    if robustness.durable {
        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;
    }
    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(path, e));
    }

    FileExt::unlock(&lock).map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "Atomic write complete");
    Ok(())
}

/// Read a file's bytes while holding a shared lock.
pub fn read_locked(path: &Path, robustness: RobustnessConfig) -> Result<Vec<u8>> {
    let _lock = acquire_lock(path, false, robustness)?;
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Read a UTF-8 file while holding a shared lock.
pub fn read_text_locked(path: &Path, robustness: RobustnessConfig) -> Result<String> {
    let bytes = read_locked(path, robustness)?;
    String::from_utf8(bytes).map_err(|e| {
        Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })
}
