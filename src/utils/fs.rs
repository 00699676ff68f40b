//! File system utilities.
//!
//! Small, synchronous helpers shared by the local store and the commands:
//! directory creation, atomic writes for the metadata file, and empty-dir
//! pruning after an uninstall.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensures a directory exists, creating it and its parents when needed.
///
/// Fails when the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Writes a file atomically: temp file, sync, rename.
///
/// Readers never observe a partially written file; either the old content or
/// the new content is visible. The parent directory is created when missing.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
        file.sync_all().context("Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Removes every directory under `root` that contains no files, bottom-up.
///
/// `root` itself is kept. Used after uninstalling files so the install
/// directory does not accumulate empty structure.
pub fn prune_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).contents_first(true).into_iter().filter_map(Result::ok) {
        if entry.path() == root || !entry.file_type().is_dir() {
            continue;
        }
        // Contents-first ordering means children were visited already, so an
        // empty read_dir here is final.
        let is_empty = fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            fs::remove_dir(entry.path()).with_context(|| {
                format!("Failed to remove empty directory: {}", entry.path().display())
            })?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Appends a suffix to a path's file name, keeping the original extension.
///
/// `content-3.zip` with suffix `.partial` becomes `content-3.zip.partial`.
#[must_use]
pub fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
