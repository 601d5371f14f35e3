use crate::error::{StoreError, StoreResult};
use crate::paths::ImportPaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use tracing::debug;

/// Exclusive advisory lock on a destination repository.
/// Released when dropped.
pub struct DestinationLock {
    _file: File,
}

impl DestinationLock {
    /// Try to acquire the destination lock (non-blocking).
    /// Returns `StoreError::Locked` if another run holds it.
    pub fn acquire(paths: &ImportPaths) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)?;

        file.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(paths.lock_file.clone()))?;

        debug!(lock = %paths.lock_file.display(), "destination lock acquired");
        Ok(Self { _file: file })
    }
}
