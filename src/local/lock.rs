//! Session-level file locking for the installation root.
//!
//! An update session exclusively owns the installation directory and its
//! metadata store for its whole duration. That exclusivity is enforced across
//! processes with an OS file lock under `.locks/`, released when the lock
//! object drops.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOCKS_DIR: &str = ".locks";
const SESSION_LOCK_FILE: &str = "session.lock";

/// An exclusive lock over one installation root.
///
/// Held for the lifetime of an update session; dropped on completion,
/// failure or cancellation alike.
pub struct SessionLock {
    _file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Acquires the exclusive session lock for the installation at `root`.
    ///
    /// Blocks until any other holder releases the lock. The blocking wait
    /// runs on the blocking thread pool so the runtime stays responsive.
    pub async fn acquire(root: &Path) -> Result<Self> {
        let locks_dir = root.join(LOCKS_DIR);
        tokio::fs::create_dir_all(&locks_dir)
            .await
            .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

        let lock_path = locks_dir.join(SESSION_LOCK_FILE);
        let lock_path_clone = lock_path.clone();

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path_clone)
                .with_context(|| {
                    format!("Failed to open lock file: {}", lock_path_clone.display())
                })?;

            file.lock_exclusive().with_context(|| {
                format!("Failed to acquire session lock: {}", lock_path_clone.display())
            })?;

            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        debug!(path = %lock_path.display(), "session lock acquired");
        Ok(Self { _file: file, path: lock_path })
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        // The OS releases the lock when the handle closes; unlock explicitly
        // so the release is not deferred to a later close.
        if let Err(e) = FileExt::unlock(&self._file) {
            warn!(path = %self.path.display(), error = %e, "failed to unlock session lock");
        } else {
            debug!(path = %self.path.display(), "session lock released");
        }
    }
}
