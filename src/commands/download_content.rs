//! Downloading a version's content package into the download area.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AppUpdaterCommand, CommandLifecycle, CommandState, UpdateContext};
use crate::core::{CancellationToken, VersionId, ensure_not_cancelled};
use crate::download::DownloadProgress;
use crate::remote::ContentSummary;
use crate::status::weight;
use crate::status::{DownloadStatusReporter, StatusMonitor};
use crate::utils::checksum::verify_file_sha256;

struct DownloadPlan {
    summary: ContentSummary,
    reporter: DownloadStatusReporter,
    destination: PathBuf,
}

/// Downloads the target version's package and verifies its checksum.
///
/// The destination is deterministic per version under the download area, so
/// an earlier session's completed package can be reused: when the file exists
/// and its declared checksum verifies, the download is skipped entirely. A
/// checksum mismatch after download deletes the file and fails with the
/// integrity error; the package must be fetched fresh.
pub struct DownloadContentCommand {
    version: VersionId,
    context: Arc<UpdateContext>,
    plan: Option<DownloadPlan>,
    lifecycle: CommandLifecycle,
}

impl DownloadContentCommand {
    /// Creates a command downloading the package of `version`.
    pub fn new(version: VersionId, context: Arc<UpdateContext>) -> Self {
        Self { version, context, plan: None, lifecycle: CommandLifecycle::new() }
    }

    /// Where the downloaded package lands.
    ///
    /// Only meaningful after `prepare`.
    #[must_use]
    pub fn destination(&self) -> Option<&PathBuf> {
        self.plan.as_ref().map(|p| &p.destination)
    }

    async fn do_prepare(&mut self, monitor: &StatusMonitor) -> Result<()> {
        let destination = {
            let mut local = self.context.local.lock().await;
            local.enable_write_access()?;
            local.download_path(self.version)
        };

        let summary = self.context.remote.content_summary(self.version).await?;
        let reporter = monitor
            .create_download_status_reporter(weight::download_package_weight(summary.size));

        self.plan = Some(DownloadPlan { summary, reporter, destination });
        Ok(())
    }

    async fn do_execute(&mut self, token: &CancellationToken) -> Result<()> {
        let plan = self.plan.as_ref().expect("prepared command has a plan");
        ensure_not_cancelled(token)?;

        if plan.destination.is_file() {
            if let Some(expected) = &plan.summary.hash {
                match verify_file_sha256(&plan.destination, expected).await {
                    Ok(()) => {
                        info!(
                            version = %self.version,
                            path = %plan.destination.display(),
                            "reusing verified package from an earlier session"
                        );
                        plan.reporter.report_bytes(plan.summary.size, plan.summary.size);
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(
                            path = %plan.destination.display(),
                            error = %e,
                            "existing package failed verification, downloading fresh"
                        );
                        tokio::fs::remove_file(&plan.destination).await.ok();
                    }
                }
            } else {
                // Without a declared checksum the leftover cannot be trusted.
                debug!(path = %plan.destination.display(), "discarding unverifiable leftover package");
                tokio::fs::remove_file(&plan.destination).await.ok();
            }
        }

        let url = self.context.remote.package_url(self.version);
        let reporter = plan.reporter.clone();
        let declared_size = plan.summary.size;
        self.context
            .downloader
            .download(
                &url,
                &plan.destination,
                Box::new(move |progress: DownloadProgress| {
                    let total = if progress.total_bytes > 0 { progress.total_bytes } else { declared_size };
                    reporter.report_bytes(progress.downloaded_bytes, total);
                }),
                token,
            )
            .await?;

        if let Some(expected) = &plan.summary.hash {
            if let Err(e) = verify_file_sha256(&plan.destination, expected).await {
                tokio::fs::remove_file(&plan.destination).await.ok();
                return Err(e);
            }
        }

        plan.reporter.report_bytes(plan.summary.size, plan.summary.size);
        info!(version = %self.version, url, "package downloaded");
        Ok(())
    }
}

#[async_trait]
impl AppUpdaterCommand for DownloadContentCommand {
    fn name(&self) -> &'static str {
        "download-content"
    }

    async fn prepare(&mut self, monitor: &StatusMonitor) -> Result<()> {
        self.lifecycle.begin_prepare()?;
        let result = self.do_prepare(monitor).await;
        self.lifecycle.finish_prepare(&result);
        result
    }

    async fn execute(&mut self, token: &CancellationToken) -> Result<()> {
        self.lifecycle.begin_execute()?;
        let result = self.do_execute(token).await;
        self.lifecycle.finish_execute(&result);
        result
    }

    fn state(&self) -> CommandState {
        self.lifecycle.state()
    }
}
