//! SHA-256 checksums for download and install verification.
//!
//! Checksums are rendered as `sha256:<hex>` strings, the same format the
//! remote summaries carry. Files are hashed in streamed chunks so package
//! archives never need to fit in memory.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::core::UpdaterError;

const HASH_READ_BUFFER: usize = 64 * 1024;

/// Computes the SHA-256 checksum of a file as a `sha256:<hex>` string.
pub async fn compute_file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .await
        .with_context(|| format!("Cannot read file for checksum calculation: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_READ_BUFFER];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .with_context(|| format!("Failed to read {} while hashing", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// Verifies a file against an expected `sha256:<hex>` checksum.
///
/// Comparison is case-insensitive. A mismatch surfaces as the typed
/// [`UpdaterError::ChecksumMismatch`] with both values rendered.
pub async fn verify_file_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = compute_file_sha256(path).await?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(UpdaterError::ChecksumMismatch {
            name: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        }
        .into());
    }
    Ok(())
}
