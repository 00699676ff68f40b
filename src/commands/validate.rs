//! Read-only integrity audit of the installed files.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::{AppUpdaterCommand, CommandLifecycle, CommandState, UpdateContext};
use crate::core::{CancellationToken, VersionId, ensure_not_cancelled};
use crate::remote::ContentSummary;
use crate::status::weight;
use crate::status::{GeneralStatusReporter, StatusMonitor};
use crate::utils::checksum::compute_file_sha256;

/// Per-file result of an integrity audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIntegrity {
    /// Registered, present, right size, right hash (when declared).
    Ok,
    /// The summary lists the file but metadata has no record of it.
    NotRegistered,
    /// Registered but absent from the installation directory.
    MissingData,
    /// Present but with a different size than the summary declares.
    InvalidSize,
    /// Present with the right size but a different checksum.
    InvalidHash,
}

impl fmt::Display for FileIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "ok",
            Self::NotRegistered => "not registered",
            Self::MissingData => "missing data",
            Self::InvalidSize => "invalid size",
            Self::InvalidHash => "invalid hash",
        };
        f.write_str(label)
    }
}

/// Outcome of auditing one version's installation.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    /// Per-file status in summary order.
    pub entries: Vec<(String, FileIntegrity)>,
}

impl IntegrityReport {
    /// Whether every audited file is intact.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.entries.iter().all(|(_, status)| *status == FileIntegrity::Ok)
    }

    /// The files that failed the audit.
    pub fn problems(&self) -> impl Iterator<Item = &(String, FileIntegrity)> {
        self.entries.iter().filter(|(_, status)| *status != FileIntegrity::Ok)
    }
}

struct ValidatePlan {
    summary: ContentSummary,
    reporter: GeneralStatusReporter,
}

/// Audits installed files against a version's content summary.
///
/// Never mutates local state: files are classified as registered, present,
/// correctly sized and, when the summary declares per-file hashes, correctly
/// hashed. The report is available through [`report`](Self::report) after
/// execution.
pub struct ValidateIntegrityCommand {
    version: VersionId,
    context: Arc<UpdateContext>,
    plan: Option<ValidatePlan>,
    report: IntegrityReport,
    lifecycle: CommandLifecycle,
}

impl ValidateIntegrityCommand {
    /// Creates a command auditing the installation against `version`.
    pub fn new(version: VersionId, context: Arc<UpdateContext>) -> Self {
        Self {
            version,
            context,
            plan: None,
            report: IntegrityReport::default(),
            lifecycle: CommandLifecycle::new(),
        }
    }

    /// The audit outcome. Empty until the command has executed.
    #[must_use]
    pub fn report(&self) -> &IntegrityReport {
        &self.report
    }

    async fn do_prepare(&mut self, monitor: &StatusMonitor) -> Result<()> {
        let summary = self.context.remote.content_summary(self.version).await?;
        let reporter = monitor.create_general_status_reporter(weight::validate_files_weight(
            summary.total_file_bytes(),
            summary.file_count(),
        ));
        self.plan = Some(ValidatePlan { summary, reporter });
        Ok(())
    }

    async fn do_execute(&mut self, token: &CancellationToken) -> Result<()> {
        let plan = self.plan.as_ref().expect("prepared command has a plan");
        let local = self.context.local.lock().await;

        let total = plan.summary.file_count();
        for (done, entry) in plan.summary.files.iter().enumerate() {
            ensure_not_cancelled(token)?;

            let status = if local.metadata().file_version(&entry.path).is_none() {
                FileIntegrity::NotRegistered
            } else {
                let installed = local.install_path(&entry.path)?;
                match tokio::fs::metadata(&installed).await {
                    Err(_) => FileIntegrity::MissingData,
                    Ok(meta) if meta.len() != entry.size => FileIntegrity::InvalidSize,
                    Ok(_) => match &entry.hash {
                        Some(expected)
                            if !compute_file_sha256(&installed)
                                .await?
                                .eq_ignore_ascii_case(expected) =>
                        {
                            FileIntegrity::InvalidHash
                        }
                        _ => FileIntegrity::Ok,
                    },
                }
            };

            if status != FileIntegrity::Ok {
                debug!(file = entry.path, status = %status, "integrity problem");
            }
            self.report.entries.push((entry.path.clone(), status));
            plan.reporter.report((done + 1) as f64 / total as f64);
        }
        plan.reporter.report(1.0);

        info!(
            version = %self.version,
            files = total,
            valid = self.report.is_valid(),
            "integrity audit finished"
        );
        Ok(())
    }
}

#[async_trait]
impl AppUpdaterCommand for ValidateIntegrityCommand {
    fn name(&self) -> &'static str {
        "validate-integrity"
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
