//! store::lock
//!
//! Exclusive file locks serializing access to a store namespace across
//! processes.
//!
//! # Invariants
//!
//! - Every read-modify-write of a namespace file happens under its
//!   `<namespace>.lock`
//! - A whole registry lifetime can be serialized with the separate
//!   `<namespace>.session.lock` (see [`lock_namespace`](super::lock_namespace))
//! - Acquisition blocks with a timeout, polling at a fixed interval
//! - Lock is automatically released on drop (RAII pattern)

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::traits::StoreError;

/// Default timeout for lock acquisition (10 seconds).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling interval when waiting for the lock (50ms).
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An exclusive lock on one lock file.
///
/// Released when this guard is dropped.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Acquire the lock at `path`, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockError`] if the lock file cannot be opened,
    /// the OS lock fails, or the timeout expires while another process
    /// holds the lock.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::LockError(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            match Self::try_acquire_internal(path)? {
                Some(lock) => return Ok(lock),
                None => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockError(format!(
                            "timed out waiting for {}",
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }

    /// Non-blocking attempt; `Ok(None)` means another holder has it.
    fn try_acquire_internal(path: &Path) -> Result<Option<Self>, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::LockError(format!("cannot open {}: {}", path.display(), e)))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(StoreError::LockError(format!("lock failed: {}", e))),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well.
        let _ = self.file.unlock();
    }
}
