//! File-based locking to serialize runs.
//!
//! Two runs at the same time would race on the same set and rule. When a
//! lock file is configured, a run holds an exclusive advisory lock on it
//! from before the fetch until it exits.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Holds an exclusive lock on the lock file.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Attempt to acquire an exclusive lock on `path` without blocking.
    /// Returns an error if another run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }

        // create without truncate: no window between creating and locking
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .context("Failed to set lock file permissions")?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another ipsum-blocker run holds {:?}. Wait for it to finish.",
                path
            )
        })?;

        Ok(Self { _file: file })
    }
}
