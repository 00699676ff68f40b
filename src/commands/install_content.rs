//! Full-content installation from an already-downloaded package.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{AppUpdaterCommand, CommandLifecycle, CommandState, UpdateContext};
use crate::archive::UnarchiveProgress;
use crate::core::{CancellationToken, UpdaterError, VersionId, ensure_not_cancelled};
use crate::remote::ContentSummary;
use crate::status::weight;
use crate::status::{GeneralStatusReporter, StatusMonitor};
use crate::utils::path_validation::validate_relative_path;

struct InstallPlan {
    summary: ContentSummary,
    unarchive_reporter: GeneralStatusReporter,
    copy_reporter: GeneralStatusReporter,
}

/// Installs a full content version from a downloaded package.
///
/// Stages the package into a scoped temporary directory, then copies each
/// file of the content summary into the live installation in listed order,
/// recording its version in local metadata per file. Only ever runs against
/// an empty installation; the update strategy schedules an uninstall first
/// otherwise.
///
/// If execution fails or is cancelled mid-loop, files already installed stay
/// installed and recorded while the rest are absent. That partial state is
/// the documented boundary: recovery is resuming or restarting the same
/// version's install, never rollback. The staging directory is removed on
/// every exit path.
pub struct InstallContentCommand {
    version: VersionId,
    context: Arc<UpdateContext>,
    package_path: PathBuf,
    plan: Option<InstallPlan>,
    lifecycle: CommandLifecycle,
}

impl InstallContentCommand {
    /// Creates a command installing `version` from the package at
    /// `package_path`.
    pub fn new(version: VersionId, context: Arc<UpdateContext>, package_path: PathBuf) -> Self {
        Self { version, context, package_path, plan: None, lifecycle: CommandLifecycle::new() }
    }

    async fn do_prepare(&mut self, monitor: &StatusMonitor) -> Result<()> {
        self.context.local.lock().await.enable_write_access()?;

        let summary = self.context.remote.content_summary(self.version).await?;
        debug!(
            version = %self.version,
            files = summary.file_count(),
            package_bytes = summary.size,
            "fetched content summary"
        );

        let unarchive_reporter =
            monitor.create_general_status_reporter(weight::unarchive_package_weight(summary.size));
        let copy_reporter = monitor.create_general_status_reporter(weight::copy_files_weight(
            summary.total_file_bytes(),
            summary.file_count(),
        ));

        self.plan = Some(InstallPlan { summary, unarchive_reporter, copy_reporter });
        Ok(())
    }

    async fn do_execute(&mut self, token: &CancellationToken) -> Result<()> {
        let plan = self.plan.as_ref().expect("prepared command has a plan");
        let mut local = self.context.local.lock().await;

        // Precondition before any file I/O: full-content installs only ever
        // run against an empty install.
        let installed = local.metadata().file_count();
        if installed > 0 {
            return Err(UpdaterError::InstallationNotEmpty { file_count: installed }.into());
        }

        let staging = local.create_temporary_dir()?;

        ensure_not_cancelled(token)?;
        let unarchive_reporter = plan.unarchive_reporter.clone();
        self.context
            .unarchiver
            .unarchive(
                &self.package_path,
                staging.path(),
                Box::new(move |progress: UnarchiveProgress| {
                    if progress.total_entries > 0 {
                        unarchive_reporter.report(
                            progress.entries_processed as f64 / progress.total_entries as f64,
                        );
                    }
                }),
                token,
            )
            .await?;
        // An empty package emits no entry progress; the step is still done.
        plan.unarchive_reporter.report(1.0);

        let total_files = plan.summary.file_count();
        for (done, entry) in plan.summary.files.iter().enumerate() {
            ensure_not_cancelled(token)?;

            let staged = staging.path().join(validate_relative_path(&entry.path)?);
            if !staged.is_file() {
                return Err(UpdaterError::MissingPackageFile { path: entry.path.clone() }.into());
            }

            local.create_or_update_file(&entry.path, &staged).await?;
            local.metadata_mut().add_or_update_file(&entry.path, self.version)?;
            plan.copy_reporter.report((done + 1) as f64 / total_files as f64);
        }
        plan.copy_reporter.report(1.0);

        info!(version = %self.version, files = total_files, "content installed");
        Ok(())
        // `staging` drops here, removing the directory on every exit path.
    }
}

#[async_trait]
impl AppUpdaterCommand for InstallContentCommand {
    fn name(&self) -> &'static str {
        "install-content"
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
