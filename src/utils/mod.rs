//! Shared utilities.
//!
//! # Modules
//!
//! - [`fs`] - File system helpers with atomic writes and empty-dir pruning
//! - [`checksum`] - Streamed SHA-256 hashing in `sha256:<hex>` format
//! - [`path_validation`] - Validation of untrusted relative paths
//! - [`progress`] - Progress bars and spinners for the CLI
//!
//! # Example
//!
//! ```rust,no_run
//! use patchup::utils::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("root/app"))?;
//! atomic_write(Path::new("root/metadata.toml"), b"content")?;
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod fs;
pub mod path_validation;
pub mod progress;

pub use checksum::{compute_file_sha256, verify_file_sha256};
pub use fs::{atomic_write, ensure_dir, path_with_suffix, prune_empty_dirs};
pub use path_validation::validate_relative_path;
pub use progress::{ProgressBar, ProgressStyle};
