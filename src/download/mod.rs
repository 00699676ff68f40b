//! The download collaborator contract and its default HTTP implementation.
//!
//! Commands consume the narrow [`Downloader`] trait: fetch one URL to one
//! destination file, reporting byte-level progress and honoring the session's
//! cancellation token. Transport internals (chunking, resume, retry) stay
//! behind the trait; tests substitute scripted downloaders.

pub mod http;

pub use http::ChunkedHttpDownloader;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::core::CancellationToken;

/// Byte counters emitted while a download progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written to the destination so far.
    pub downloaded_bytes: u64,
    /// Total bytes expected, 0 when the server does not declare a length.
    pub total_bytes: u64,
}

/// Callback receiving [`DownloadProgress`] updates.
pub type ProgressCallback = Box<dyn FnMut(DownloadProgress) + Send>;

/// Downloads content to local files.
///
/// Implementations emit monotonically increasing progress, fail with the
/// typed network error on connectivity loss, and honor cancellation by
/// aborting the transfer within one chunk.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` to `destination`.
    ///
    /// The destination file appears atomically: it is absent or stale until
    /// the transfer completes, then renamed into place.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        on_progress: ProgressCallback,
        token: &CancellationToken,
    ) -> Result<()>;
}
