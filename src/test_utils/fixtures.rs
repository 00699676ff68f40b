//! Package fixtures: zip archives with matching content summaries.

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

use crate::remote::{ContentFileEntry, ContentSummary};

/// A built package archive and the summary that describes it.
pub struct PackageFixture {
    /// Location of the zip file.
    pub path: PathBuf,
    /// Summary consistent with the archive: sizes and hashes match.
    pub summary: ContentSummary,
}

/// The `sha256:<hex>` digest of a byte slice.
#[must_use]
pub fn sha256_of(content: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(content)))
}

/// Builds a zip package at `path` containing `files` and returns it with a
/// consistent [`ContentSummary`] (per-file sizes and hashes, package size
/// and hash).
pub fn build_package(path: &Path, files: &[(&str, &[u8])]) -> Result<PackageFixture> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let mut entries = Vec::new();
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(content)?;
        entries.push(ContentFileEntry {
            path: (*name).to_string(),
            size: content.len() as u64,
            hash: Some(sha256_of(content)),
        });
    }
    writer.finish()?;

    let package_bytes = std::fs::read(path)?;
    let summary = ContentSummary {
        size: package_bytes.len() as u64,
        hash: Some(sha256_of(&package_bytes)),
        files: entries,
    };

    Ok(PackageFixture { path: path.to_path_buf(), summary })
}
