//! The unarchive collaborator contract and its default zip implementation.
//!
//! Commands consume the narrow [`Unarchiver`] trait: extract one package into
//! one directory, reporting per-entry progress and honoring the session's
//! cancellation token. The archive binary format stays behind the trait.

pub mod zip;

pub use self::zip::ZipUnarchiver;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::core::CancellationToken;

/// Per-entry progress emitted while a package is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnarchiveProgress {
    /// Entry name as stored in the archive.
    pub entry_name: String,
    /// Whether the entry is a file (directories are also reported).
    pub is_file: bool,
    /// Entries extracted so far, including this one.
    pub entries_processed: usize,
    /// Total entries in the archive.
    pub total_entries: usize,
}

/// Callback receiving [`UnarchiveProgress`] updates.
pub type EntryCallback = Box<dyn FnMut(UnarchiveProgress) + Send>;

/// Extracts content packages into a directory.
///
/// Implementations fail with the typed package error on corrupt input,
/// reject entries that would escape the destination, and honor cancellation
/// within one archive entry.
#[async_trait]
pub trait Unarchiver: Send + Sync {
    /// Extracts `package` into `destination`.
    async fn unarchive(
        &self,
        package: &Path,
        destination: &Path,
        on_entry: EntryCallback,
        token: &CancellationToken,
    ) -> Result<()>;
}
