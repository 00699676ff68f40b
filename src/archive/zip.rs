//! Zip extraction on the blocking thread pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use super::{EntryCallback, UnarchiveProgress, Unarchiver};
use crate::core::{CancellationToken, UpdaterError, ensure_not_cancelled};

/// Unarchiver for zip content packages.
///
/// Extraction is synchronous zip-crate work, so it runs via
/// `spawn_blocking`; the cancellation token is checked once per entry.
/// Entry names are resolved with `enclosed_name`, rejecting anything that
/// would land outside the destination directory.
pub struct ZipUnarchiver;

impl ZipUnarchiver {
    /// Creates a zip unarchiver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZipUnarchiver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Unarchiver for ZipUnarchiver {
    async fn unarchive(
        &self,
        package: &Path,
        destination: &Path,
        mut on_entry: EntryCallback,
        token: &CancellationToken,
    ) -> Result<()> {
        let package = package.to_path_buf();
        let destination = destination.to_path_buf();
        let token = token.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = fs::File::open(&package)
                .with_context(|| format!("Cannot open content package: {}", package.display()))?;
            let mut archive = zip::ZipArchive::new(file)
                .map_err(|e| UpdaterError::InvalidPackage { reason: e.to_string() })?;

            let total_entries = archive.len();
            debug!(package = %package.display(), entries = total_entries, "extracting package");

            for index in 0..total_entries {
                ensure_not_cancelled(&token)?;

                let mut entry = archive
                    .by_index(index)
                    .map_err(|e| UpdaterError::InvalidPackage { reason: e.to_string() })?;
                let entry_name = entry.name().to_string();

                let Some(enclosed) = entry.enclosed_name() else {
                    return Err(UpdaterError::UnsafeArchivePath { entry: entry_name }.into());
                };
                let target = destination.join(enclosed);
                let is_file = entry.is_file();

                if is_file {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create directory: {}", parent.display())
                        })?;
                    }
                    let mut out = fs::File::create(&target).with_context(|| {
                        format!("Failed to create extracted file: {}", target.display())
                    })?;
                    io::copy(&mut entry, &mut out)
                        .map_err(|e| UpdaterError::InvalidPackage { reason: e.to_string() })?;

                    #[cfg(unix)]
                    if let Some(mode) = entry.unix_mode() {
                        use std::os::unix::fs::PermissionsExt;
                        fs::set_permissions(&target, fs::Permissions::from_mode(mode)).ok();
                    }
                } else {
                    fs::create_dir_all(&target).with_context(|| {
                        format!("Failed to create directory: {}", target.display())
                    })?;
                }

                on_entry(UnarchiveProgress {
                    entry_name,
                    is_file,
                    entries_processed: index + 1,
                    total_entries,
                });
            }

            Ok(())
        })
        .await
        .context("Extraction task panicked")?
    }
}
