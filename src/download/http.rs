//! Chunked HTTP downloader with resume and bounded retry.
//!
//! Content streams into a `.partial` sibling of the destination; an
//! interrupted transfer resumes from the partial file's length with an HTTP
//! Range request. Transient transport failures are retried with exponential
//! backoff; cancellation and non-transport failures are never retried. The
//! destination file only appears once the transfer is complete.

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::RANGE;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::{DownloadProgress, Downloader, ProgressCallback};
use crate::core::{CancellationToken, UpdaterError, ensure_not_cancelled, is_cancellation};
use crate::utils::fs::{ensure_dir, path_with_suffix};

const RETRY_BASE_DELAY_MS: u64 = 250;
const MAX_RETRIES: usize = 3;

/// Streaming HTTP downloader over `reqwest`.
pub struct ChunkedHttpDownloader {
    client: reqwest::Client,
}

impl ChunkedHttpDownloader {
    /// Creates a downloader with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        on_progress: &mut (dyn FnMut(DownloadProgress) + Send),
        token: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(token)?;

        if let Some(parent) = destination.parent() {
            ensure_dir(parent)?;
        }
        let partial = path_with_suffix(destination, ".partial");
        let resume_from =
            tokio::fs::metadata(&partial).await.map(|m| m.len()).unwrap_or_default();

        let mut request = self.client.get(url);
        if resume_from > 0 {
            request = request.header(RANGE, format!("bytes={resume_from}-"));
        }
        let response = request.send().await.map_err(|e| network_error(url, e.to_string()))?;

        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            // The partial file disagrees with the server; discard and restart.
            tokio::fs::remove_file(&partial).await.ok();
            return Err(network_error(url, "stale partial file rejected by server".to_string()));
        }

        let resumed = resume_from > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        let response =
            response.error_for_status().map_err(|e| network_error(url, e.to_string()))?;

        let mut downloaded = if resumed { resume_from } else { 0 };
        let total_bytes = downloaded + response.content_length().unwrap_or(0);
        if resumed {
            debug!(url, resume_from, "resuming interrupted download");
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(resumed)
            .truncate(!resumed)
            .open(&partial)
            .await
            .with_context(|| format!("Failed to open partial file: {}", partial.display()))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            ensure_not_cancelled(token)?;
            let chunk = chunk.map_err(|e| network_error(url, e.to_string()))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write to: {}", partial.display()))?;
            downloaded += chunk.len() as u64;
            on_progress(DownloadProgress { downloaded_bytes: downloaded, total_bytes });
        }

        file.sync_all().await.context("Failed to sync downloaded file to disk")?;
        drop(file);

        tokio::fs::rename(&partial, destination).await.with_context(|| {
            format!("Failed to move completed download to: {}", destination.display())
        })?;
        debug!(url, bytes = downloaded, "download complete");
        Ok(())
    }
}

impl Default for ChunkedHttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Downloader for ChunkedHttpDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        mut on_progress: ProgressCallback,
        token: &CancellationToken,
    ) -> Result<()> {
        let mut backoff =
            ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS).map(jitter).take(MAX_RETRIES);

        loop {
            match self.attempt(url, destination, on_progress.as_mut(), token).await {
                Ok(()) => return Ok(()),
                Err(e) if is_cancellation(&e) || !is_transport_error(&e) => return Err(e),
                Err(e) => match backoff.next() {
                    Some(delay) => {
                        warn!(url, error = %e, retry_in_ms = delay.as_millis() as u64, "transient download failure, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}

fn network_error(url: &str, reason: String) -> anyhow::Error {
    UpdaterError::NetworkError { operation: format!("download {url}"), reason }.into()
}

fn is_transport_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<UpdaterError>(), Some(UpdaterError::NetworkError { .. }))
}
