//! Content summaries: the per-version manifest of files and sizes.

use serde::{Deserialize, Serialize};

/// One file of a content version as declared by its summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFileEntry {
    /// Relative path under the installation directory.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Expected `sha256:<hex>` checksum, when the publisher provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Manifest of a target content version.
///
/// Fetched from the remote source once per install and immutable afterwards;
/// the owning command holds it for the duration of one command execution.
/// An empty file list is valid and describes a version with no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentSummary {
    /// Byte size of the downloadable package.
    pub size: u64,
    /// Expected `sha256:<hex>` checksum of the package file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Files contained in the version, in installation order.
    #[serde(default)]
    pub files: Vec<ContentFileEntry>,
}

impl ContentSummary {
    /// Total byte size of all listed files.
    #[must_use]
    pub fn total_file_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Number of listed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
