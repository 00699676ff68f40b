//! Removal of every registered file of the local installation.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{AppUpdaterCommand, CommandLifecycle, CommandState, UpdateContext};
use crate::core::{CancellationToken, ensure_not_cancelled};
use crate::status::weight;
use crate::status::{GeneralStatusReporter, StatusMonitor};

/// Uninstalls every file recorded in local metadata.
///
/// Files are removed in registration order, each metadata entry dropping
/// with its file, so an interrupted uninstall leaves the record accurate.
/// Empty directories left behind are pruned afterwards. An empty store
/// completes immediately with the reporter at 1.0.
pub struct UninstallCommand {
    context: Arc<UpdateContext>,
    reporter: Option<GeneralStatusReporter>,
    lifecycle: CommandLifecycle,
}

impl UninstallCommand {
    /// Creates a command removing the whole installation.
    pub fn new(context: Arc<UpdateContext>) -> Self {
        Self { context, reporter: None, lifecycle: CommandLifecycle::new() }
    }

    async fn do_prepare(&mut self, monitor: &StatusMonitor) -> Result<()> {
        let mut local = self.context.local.lock().await;
        local.enable_write_access()?;

        let file_count = local.metadata().file_count();
        self.reporter =
            Some(monitor.create_general_status_reporter(weight::remove_files_weight(file_count)));
        Ok(())
    }

    async fn do_execute(&mut self, token: &CancellationToken) -> Result<()> {
        let reporter = self.reporter.as_ref().expect("prepared command has a reporter");
        let mut local = self.context.local.lock().await;

        let paths = local.metadata().file_names();
        let total = paths.len();
        for (done, path) in paths.iter().enumerate() {
            ensure_not_cancelled(token)?;

            // A file missing on disk is logged, not fatal: the record is
            // stale and removing it is exactly the goal.
            if !local.remove_file(path).await? {
                warn!(file = path, "registered file was already missing");
            }
            local.metadata_mut().remove_file(path)?;
            reporter.report((done + 1) as f64 / total as f64);
        }

        let pruned = local.prune_empty_install_dirs()?;
        reporter.report(1.0);

        info!(files = total, pruned_dirs = pruned, "installation removed");
        Ok(())
    }
}

#[async_trait]
impl AppUpdaterCommand for UninstallCommand {
    fn name(&self) -> &'static str {
        "uninstall"
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
