//! Path validation for untrusted relative paths.
//!
//! Content summaries and archive entries arrive from the network; every path
//! they name is validated before being joined under the installation or
//! staging directory, preventing traversal out of the managed tree.

use anyhow::Result;
use std::path::{Component, Path, PathBuf};

use crate::core::UpdaterError;

/// Validates an untrusted relative path and returns it as a [`PathBuf`].
///
/// Rejects empty paths, absolute paths, Windows drive prefixes, and any
/// `..` component. `.` components are stripped.
pub fn validate_relative_path(path: &str) -> Result<PathBuf> {
    let reject = |reason: &'static str| {
        Err(UpdaterError::InvalidRelativePath { path: path.to_string(), reason }.into())
    };

    if path.is_empty() {
        return reject("path is empty");
    }

    let mut validated = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => validated.push(part),
            Component::CurDir => {}
            Component::ParentDir => return reject("contains a parent directory reference"),
            Component::RootDir | Component::Prefix(_) => return reject("path is absolute"),
        }
    }

    if validated.as_os_str().is_empty() {
        return reject("path has no components");
    }

    Ok(validated)
}
