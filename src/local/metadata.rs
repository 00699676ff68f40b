//! Persisted record of installed files and their versions.
//!
//! `metadata.toml` is the single source of truth for what is installed: a
//! mapping from relative file path to the content version at which that file
//! was last installed, kept in insertion order. A fresh installation has an
//! empty mapping. Every mutation is persisted atomically before the mutating
//! call returns, so after a mid-update failure the file reflects exactly the
//! files that were actually installed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{UpdaterError, VersionId};
use crate::utils::fs::atomic_write;

/// Current metadata file format version.
const METADATA_FORMAT_VERSION: u32 = 1;

/// One installed file as recorded in the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFile {
    /// Relative path under the installation directory.
    pub path: String,
    /// Content version this file was installed from.
    pub version_id: VersionId,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetaDocument {
    /// Metadata format version for forward compatibility.
    version: u32,
    /// When the store was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    /// Installed files in installation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<InstalledFile>,
}

impl Default for MetaDocument {
    fn default() -> Self {
        Self { version: METADATA_FORMAT_VERSION, updated_at: None, files: Vec::new() }
    }
}

/// The version makeup of the local installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstalledState {
    /// No files recorded; the app is not installed.
    Empty,
    /// Every recorded file carries the same version.
    Version(VersionId),
    /// Recorded files carry differing versions (an interrupted update).
    Mixed,
}

/// Persisted path → version mapping for the local installation.
///
/// Loaded once per session through [`LocalData`](super::LocalData); commands
/// mutate it through [`add_or_update_file`](Self::add_or_update_file) and
/// [`remove_file`](Self::remove_file), each of which persists before
/// returning.
#[derive(Debug)]
pub struct LocalMetaData {
    path: PathBuf,
    document: MetaDocument,
}

impl LocalMetaData {
    /// Loads the metadata store from `path`.
    ///
    /// A missing or empty file yields an empty store; unparseable content is
    /// the typed [`UpdaterError::MetadataParseError`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self { path: path.to_path_buf(), document: MetaDocument::default() });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read metadata file: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self { path: path.to_path_buf(), document: MetaDocument::default() });
        }

        let document: MetaDocument =
            toml::from_str(&content).map_err(|e| UpdaterError::MetadataParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { path: path.to_path_buf(), document })
    }

    /// Relative paths of all installed files, in installation order.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.document.files.iter().map(|f| f.path.clone()).collect()
    }

    /// The recorded entries, for consumers outside the update pipeline.
    ///
    /// Same sequence as [`file_names`](Self::file_names); launchers read it
    /// to enumerate what an installed version consists of.
    #[must_use]
    pub fn registered_entries(&self) -> Vec<String> {
        self.file_names()
    }

    /// The version a file was installed at, if it is recorded.
    #[must_use]
    pub fn file_version(&self, path: &str) -> Option<VersionId> {
        self.document.files.iter().find(|f| f.path == path).map(|f| f.version_id)
    }

    /// Whether no files are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.files.is_empty()
    }

    /// Number of recorded files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.document.files.len()
    }

    /// Classifies the installation by the versions its files carry.
    #[must_use]
    pub fn installed_state(&self) -> InstalledState {
        let mut versions = self.document.files.iter().map(|f| f.version_id);
        let Some(first) = versions.next() else {
            return InstalledState::Empty;
        };
        if versions.all(|v| v == first) {
            InstalledState::Version(first)
        } else {
            InstalledState::Mixed
        }
    }

    /// Records `path` as installed at `version`, persisting immediately.
    ///
    /// An existing entry for the path is updated in place, keeping its
    /// position in the order.
    pub fn add_or_update_file(&mut self, path: &str, version: VersionId) -> Result<()> {
        match self.document.files.iter_mut().find(|f| f.path == path) {
            Some(entry) => entry.version_id = version,
            None => {
                self.document.files.push(InstalledFile { path: path.to_string(), version_id: version });
            }
        }
        debug!(file = path, version = %version, "recorded installed file");
        self.save()
    }

    /// Removes the entry for `path`, persisting immediately.
    ///
    /// Removing an unrecorded path is a no-op.
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let before = self.document.files.len();
        self.document.files.retain(|f| f.path != path);
        if self.document.files.len() == before {
            debug!(file = path, "remove of unrecorded file ignored");
            return Ok(());
        }
        debug!(file = path, "removed installed file record");
        self.save()
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&mut self) -> Result<()> {
        self.document.updated_at = Some(Utc::now());
        let mut content = String::from("# Auto-generated by patchup - DO NOT EDIT\n");
        content.push_str(&toml::to_string_pretty(&self.document)?);
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Cannot write metadata file: {}", self.path.display()))
    }
}
