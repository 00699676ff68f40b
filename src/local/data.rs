//! The on-disk installation layout and its mutation gate.
//!
//! [`LocalData`] roots everything the updater touches under one directory:
//!
//! ```text
//! root/
//!   app/            live installation
//!   temp/           scoped staging directories
//!   downloads/      downloaded content packages
//!   metadata.toml   installed path → version record
//!   .locks/         session lock files
//! ```
//!
//! The layout is read-only by default: every mutating operation fails with
//! the typed [`UpdaterError::WriteAccessRequired`] until
//! [`enable_write_access`](LocalData::enable_write_access) has run. Enabling
//! is idempotent and stays enabled for the session.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::core::{UpdaterError, VersionId};
use crate::local::metadata::LocalMetaData;
use crate::utils::fs::{ensure_dir, prune_empty_dirs};
use crate::utils::path_validation::validate_relative_path;

const INSTALL_DIR: &str = "app";
const TEMP_DIR: &str = "temp";
const DOWNLOAD_DIR: &str = "downloads";
const METADATA_FILE: &str = "metadata.toml";

/// A scoped, uniquely named staging directory under the temp area.
///
/// Created at the start of a staged operation and removed recursively when
/// dropped, success or failure, so partially extracted packages never pollute
/// persistent storage.
pub struct TemporaryDirectory {
    inner: TempDir,
}

impl TemporaryDirectory {
    /// The staging directory's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }
}

/// The local installation directory tree plus its metadata store.
///
/// Exclusively owned by one update session for its duration; see
/// [`SessionLock`](super::SessionLock) for the cross-process guarantee.
pub struct LocalData {
    root: PathBuf,
    metadata: LocalMetaData,
    write_access: bool,
}

impl LocalData {
    /// Opens the installation rooted at `root`, loading its metadata.
    ///
    /// The root itself may not exist yet; directories are created when write
    /// access is enabled.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = LocalMetaData::load(&root.join(METADATA_FILE))?;
        Ok(Self { root, metadata, write_access: false })
    }

    /// Enables mutation of the installation tree.
    ///
    /// Creates the directory layout and probes that the root is writable.
    /// Idempotent; a second call is a no-op. Must run before any mutating
    /// operation.
    pub fn enable_write_access(&mut self) -> Result<()> {
        if self.write_access {
            return Ok(());
        }

        ensure_dir(&self.root)?;
        ensure_dir(&self.install_dir())?;
        ensure_dir(&self.temporary_data_dir())?;
        ensure_dir(&self.download_dir())?;

        // Probe writability so a read-only root fails here, not mid-install.
        let probe = self.root.join(".write-probe");
        std::fs::write(&probe, b"")
            .with_context(|| format!("Installation root is not writable: {}", self.root.display()))?;
        std::fs::remove_file(&probe).ok();

        self.write_access = true;
        debug!(root = %self.root.display(), "write access enabled");
        Ok(())
    }

    /// Whether write access has been enabled for this session.
    #[must_use]
    pub fn has_write_access(&self) -> bool {
        self.write_access
    }

    /// The root of the managed tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The live installation directory.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.root.join(INSTALL_DIR)
    }

    /// The area scoped staging directories are created under.
    #[must_use]
    pub fn temporary_data_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    /// The download cache area.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.root.join(DOWNLOAD_DIR)
    }

    /// Deterministic location of a version's downloaded package.
    #[must_use]
    pub fn download_path(&self, version: VersionId) -> PathBuf {
        self.download_dir().join(format!("content-{version}.zip"))
    }

    /// The metadata store.
    #[must_use]
    pub fn metadata(&self) -> &LocalMetaData {
        &self.metadata
    }

    /// Mutable access to the metadata store.
    pub fn metadata_mut(&mut self) -> &mut LocalMetaData {
        &mut self.metadata
    }

    /// Validates `relative` and joins it under the installation directory.
    pub fn install_path(&self, relative: &str) -> Result<PathBuf> {
        Ok(self.install_dir().join(validate_relative_path(relative)?))
    }

    /// Creates a scoped staging directory under the temp area.
    ///
    /// Requires write access. The directory is removed recursively when the
    /// returned handle drops.
    pub fn create_temporary_dir(&self) -> Result<TemporaryDirectory> {
        self.require_write_access("create staging directory")?;
        let inner = tempfile::Builder::new()
            .prefix("staging-")
            .tempdir_in(self.temporary_data_dir())
            .context("Failed to create staging directory")?;
        debug!(path = %inner.path().display(), "created staging directory");
        Ok(TemporaryDirectory { inner })
    }

    /// Copies `source` into the live installation at `relative`.
    ///
    /// Requires write access. Parent directories are created; an existing
    /// file at the destination is replaced.
    pub async fn create_or_update_file(&self, relative: &str, source: &Path) -> Result<()> {
        self.require_write_access("install file")?;
        let destination = self.install_path(relative)?;
        if let Some(parent) = destination.parent() {
            ensure_dir(parent)?;
        }
        tokio::fs::copy(source, &destination).await.with_context(|| {
            format!("Failed to install {} to {}", source.display(), destination.display())
        })?;
        debug!(file = relative, "installed file");
        Ok(())
    }

    /// Deletes the installed file at `relative`.
    ///
    /// Requires write access. Returns whether a file was actually removed;
    /// a missing file is not an error.
    pub async fn remove_file(&self, relative: &str) -> Result<bool> {
        self.require_write_access("remove file")?;
        let path = self.install_path(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file = relative, "removed installed file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove installed file: {}", path.display()))
            }
        }
    }

    /// Removes empty directories left under the install dir after uninstalls.
    ///
    /// Requires write access.
    pub fn prune_empty_install_dirs(&self) -> Result<usize> {
        self.require_write_access("prune directories")?;
        prune_empty_dirs(&self.install_dir())
    }

    fn require_write_access(&self, operation: &str) -> Result<()> {
        if !self.write_access {
            return Err(UpdaterError::WriteAccessRequired { operation: operation.to_string() }.into());
        }
        Ok(())
    }
}
