//! In-memory fakes for the collaborator traits.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::core::{CancellationToken, UpdaterError, VersionId, ensure_not_cancelled};
use crate::download::{DownloadProgress, Downloader, ProgressCallback};
use crate::remote::{ContentSummary, RemoteSource};
use crate::status::{OverallStatus, StatusMonitor, StatusSubscription};

/// Remote source backed by in-memory summaries.
pub struct StaticRemoteSource {
    latest: VersionId,
    summaries: HashMap<u32, ContentSummary>,
}

impl StaticRemoteSource {
    /// A source whose latest version is `latest`, with no summaries yet.
    #[must_use]
    pub fn new(latest: VersionId) -> Self {
        Self { latest, summaries: HashMap::new() }
    }

    /// Registers the summary served for `version`.
    #[must_use]
    pub fn with_summary(mut self, version: VersionId, summary: ContentSummary) -> Self {
        self.summaries.insert(version.value(), summary);
        self
    }
}

#[async_trait]
impl RemoteSource for StaticRemoteSource {
    async fn latest_version_id(&self) -> Result<VersionId> {
        Ok(self.latest)
    }

    async fn content_summary(&self, version: VersionId) -> Result<ContentSummary> {
        self.summaries
            .get(&version.value())
            .cloned()
            .ok_or_else(|| UpdaterError::VersionNotFound { version: version.value() }.into())
    }

    fn package_url(&self, version: VersionId) -> String {
        format!("static://versions/{version}/package.zip")
    }
}

const FAKE_CHUNK_SIZE: usize = 16;

/// Downloader serving scripted payloads, chunk by chunk.
///
/// Unknown URLs fail with the typed network error; URLs registered as
/// failing abort mid-transfer after one chunk. Progress and cancellation
/// behave like the real downloader's, one chunk at a time.
#[derive(Clone, Default)]
pub struct FakeDownloader {
    payloads: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeDownloader {
    /// A downloader with no payloads registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the bytes served for `url`.
    #[must_use]
    pub fn with_payload(self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.payloads.lock().unwrap().insert(url.into(), bytes);
        self
    }

    /// Registers the payload of a package file so a command downloading it
    /// receives exactly the archive on disk.
    pub fn with_package_file(self, url: impl Into<String>, package: &Path) -> Result<Self> {
        let bytes = std::fs::read(package)?;
        Ok(self.with_payload(url, bytes))
    }

    /// Makes `url` fail with a transport error after the first chunk.
    #[must_use]
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failing.lock().unwrap().insert(url.into());
        self
    }

    /// How many downloads have been attempted.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        mut on_progress: ProgressCallback,
        token: &CancellationToken,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ensure_not_cancelled(token)?;

        let fails = self.failing.lock().unwrap().contains(url);
        let payload = self.payloads.lock().unwrap().get(url).cloned();
        let Some(payload) = payload else {
            return Err(UpdaterError::NetworkError {
                operation: format!("download {url}"),
                reason: "no payload registered".to_string(),
            }
            .into());
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let total = payload.len() as u64;
        let mut written = Vec::with_capacity(payload.len());
        for (index, chunk) in payload.chunks(FAKE_CHUNK_SIZE).enumerate() {
            ensure_not_cancelled(token)?;
            if fails && index == 1 {
                return Err(UpdaterError::NetworkError {
                    operation: format!("download {url}"),
                    reason: "scripted connection loss".to_string(),
                }
                .into());
            }
            written.extend_from_slice(chunk);
            on_progress(DownloadProgress {
                downloaded_bytes: written.len() as u64,
                total_bytes: total,
            });
        }

        tokio::fs::write(destination, written).await?;
        Ok(())
    }
}

/// Records every overall status a monitor publishes.
pub struct StatusRecorder {
    statuses: Arc<Mutex<Vec<OverallStatus>>>,
    _subscription: StatusSubscription,
}

impl StatusRecorder {
    /// Subscribes to `monitor` and starts recording.
    #[must_use]
    pub fn attach(monitor: &StatusMonitor) -> Self {
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&statuses);
        let subscription = monitor.subscribe(move |status: &OverallStatus| {
            sink.lock().unwrap().push(status.clone());
        });
        Self { statuses, _subscription: subscription }
    }

    /// Every recorded overall progress value, in publish order.
    #[must_use]
    pub fn progress_values(&self) -> Vec<f64> {
        self.statuses.lock().unwrap().iter().map(|s| s.progress).collect()
    }

    /// The most recent overall progress value.
    #[must_use]
    pub fn last_progress(&self) -> Option<f64> {
        self.statuses.lock().unwrap().last().map(|s| s.progress)
    }

    /// Whether the recorded progress never decreased.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.progress_values().windows(2).all(|pair| pair[0] <= pair[1])
    }
}
