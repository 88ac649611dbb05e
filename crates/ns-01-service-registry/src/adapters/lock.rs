//! # Registry Lock
//!
//! Uses `fs2` for cross-platform advisory locking (flock on Unix, LockFile on
//! Windows). The lock lives in a sibling file so the document itself can be
//! replaced by `rename` while the lock is held.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::domain::errors::RegistryError;

/// How long a writer waits for another writer before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Exclusive writer lock on a registry document.
///
/// Released on drop. The lock file is never deleted: unlinking it while
/// another process waits on the old inode would let two writers in at once.
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Lock file path for a registry document (`services.json` -> `services.json.lock`).
    pub fn path_for(document: &Path) -> PathBuf {
        let mut name = document
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        document.with_file_name(name)
    }

    /// Take the exclusive lock for `document`, waiting up to
    /// [`DEFAULT_LOCK_TIMEOUT`].
    pub fn acquire(document: &Path) -> Result<Self, RegistryError> {
        Self::acquire_with_timeout(document, DEFAULT_LOCK_TIMEOUT)
    }

    /// Take the exclusive lock for `document`, retrying with exponential
    /// backoff until `timeout` expires.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Lock` with `io::ErrorKind::TimedOut` if another
    /// writer still holds the lock at the deadline.
    pub fn acquire_with_timeout(document: &Path, timeout: Duration) -> Result<Self, RegistryError> {
        let path = Self::path_for(document);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::Lock {
                path: path.clone(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| RegistryError::Lock {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        let mut retry_delay = INITIAL_RETRY_DELAY;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file, path }),
                Err(e) if !is_contended(&e) => {
                    return Err(RegistryError::Lock { path, source: e });
                }
                Err(_) => {}
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    path = %path.display(),
                    waited_ms = timeout.as_millis() as u64,
                    "Registry lock still held by another writer"
                );
                return Err(RegistryError::Lock {
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("held by another writer for over {timeout:?}"),
                    ),
                    path,
                });
            }

            std::thread::sleep(retry_delay.min(deadline - now));
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
