//! Relative cost weights for update sub-operations.
//!
//! Downloading, unarchiving, copying, removing and hashing files have wildly
//! different per-byte costs, but their progress must sum into one 0..1 scale.
//! Each function here returns a weight linear in the operation's cost proxy
//! (bytes when known, file count otherwise), so doubling the size of one step
//! roughly doubles its share of the overall progress signal.
//!
//! The coefficients are relative, not absolute: only their ratios matter to
//! the weighted mean computed by the status monitor.

/// Cost per downloaded byte. The baseline unit.
const DOWNLOAD_BYTE_COST: f64 = 1.0;

/// Cost per unarchived byte. Local decompression is much faster than transfer.
const UNARCHIVE_BYTE_COST: f64 = 0.12;

/// Cost per copied or hashed byte.
const COPY_BYTE_COST: f64 = 0.06;

/// Assumed file size when a summary carries no byte counts.
const FALLBACK_FILE_SIZE: u64 = 64 * 1024;

/// Weight of downloading a package of `package_size` bytes.
#[must_use]
pub fn download_package_weight(package_size: u64) -> f64 {
    package_size as f64 * DOWNLOAD_BYTE_COST
}

/// Weight of unarchiving a package of `package_size` bytes.
#[must_use]
pub fn unarchive_package_weight(package_size: u64) -> f64 {
    package_size as f64 * UNARCHIVE_BYTE_COST
}

/// Weight of copying a version's files into the live installation.
///
/// Uses total bytes when the summary carries sizes, falling back to a
/// per-file constant when it does not. Zero files weigh nothing.
#[must_use]
pub fn copy_files_weight(total_bytes: u64, file_count: usize) -> f64 {
    effective_bytes(total_bytes, file_count) as f64 * COPY_BYTE_COST
}

/// Weight of hashing installed files against a summary.
///
/// Verification reads every byte once, the same cost shape as copying.
#[must_use]
pub fn validate_files_weight(total_bytes: u64, file_count: usize) -> f64 {
    effective_bytes(total_bytes, file_count) as f64 * COPY_BYTE_COST
}

/// Weight of removing `file_count` installed files.
///
/// Removal cost does not scale with file contents, only with count.
#[must_use]
pub fn remove_files_weight(file_count: usize) -> f64 {
    file_count as f64 * FALLBACK_FILE_SIZE as f64 * COPY_BYTE_COST
}

fn effective_bytes(total_bytes: u64, file_count: usize) -> u64 {
    if total_bytes > 0 { total_bytes } else { file_count as u64 * FALLBACK_FILE_SIZE }
}
