//! The updater: strategy selection and session execution.
//!
//! [`AppUpdater`] owns the collaborators and turns "bring this installation
//! to version N" into a sequence of commands based on the installed state.
//! Each attempt is one single-use [`UpdateSession`] carrying its own
//! cancellation token, status monitor and exclusive session lock; a new
//! attempt always builds a new session.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::archive::Unarchiver;
use crate::commands::{
    AppUpdaterCommand, DownloadContentCommand, InstallContentCommand, UninstallCommand,
    UpdateContext,
};
use crate::core::{CancellationToken, VersionId};
use crate::download::Downloader;
use crate::local::{InstalledState, LocalData, SessionLock};
use crate::remote::RemoteSource;
use crate::status::StatusMonitor;

/// Terminal outcome of a successful session run.
///
/// Failure and cancellation travel as errors; cancellation stays
/// distinguishable via [`is_cancellation`](crate::core::is_cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The installation already carried the target version.
    UpToDate(VersionId),
    /// The target version was installed.
    Installed(VersionId),
}

/// Builds update sessions against one installation root.
pub struct AppUpdater {
    context: Arc<UpdateContext>,
    root: PathBuf,
}

impl AppUpdater {
    /// Creates an updater over `local` and the given collaborators.
    pub fn new(
        local: LocalData,
        remote: Arc<dyn RemoteSource>,
        downloader: Arc<dyn Downloader>,
        unarchiver: Arc<dyn Unarchiver>,
    ) -> Self {
        let root = local.root().to_path_buf();
        let context =
            Arc::new(UpdateContext { local: Mutex::new(local), remote, downloader, unarchiver });
        Self { context, root }
    }

    /// The shared command context, for building standalone commands.
    #[must_use]
    pub fn context(&self) -> Arc<UpdateContext> {
        Arc::clone(&self.context)
    }

    /// Builds a session bringing the installation to `target`, or to the
    /// remote's latest version when `target` is `None`.
    ///
    /// The strategy follows the installed state:
    /// - empty install → download + install
    /// - same version everywhere → nothing to do
    /// - different or mixed versions → uninstall + download + install
    pub async fn session(&self, target: Option<VersionId>) -> Result<UpdateSession> {
        let target = match target {
            Some(version) => version,
            None => self.context.remote.latest_version_id().await?,
        };
        let installed = self.context.local.lock().await.metadata().installed_state();

        let mut commands: Vec<Box<dyn AppUpdaterCommand>> = Vec::new();
        match installed {
            InstalledState::Version(current) if current == target => {
                debug!(version = %target, "already up to date");
            }
            InstalledState::Empty => {
                commands.push(Box::new(DownloadContentCommand::new(target, self.context())));
                commands.push(Box::new(InstallContentCommand::new(
                    target,
                    self.context(),
                    self.download_path(target).await,
                )));
            }
            InstalledState::Version(current) => {
                debug!(from = %current, to = %target, "reinstalling for version change");
                self.push_reinstall(&mut commands, target).await;
            }
            InstalledState::Mixed => {
                debug!(to = %target, "mixed versions recorded, reinstalling");
                self.push_reinstall(&mut commands, target).await;
            }
        }

        Ok(UpdateSession {
            id: Uuid::new_v4(),
            target,
            root: self.root.clone(),
            commands,
            token: CancellationToken::new(),
            monitor: StatusMonitor::new(),
        })
    }

    async fn push_reinstall(&self, commands: &mut Vec<Box<dyn AppUpdaterCommand>>, target: VersionId) {
        commands.push(Box::new(UninstallCommand::new(self.context())));
        commands.push(Box::new(DownloadContentCommand::new(target, self.context())));
        commands.push(Box::new(InstallContentCommand::new(
            target,
            self.context(),
            self.download_path(target).await,
        )));
    }

    async fn download_path(&self, version: VersionId) -> PathBuf {
        self.context.local.lock().await.download_path(version)
    }
}

/// One end-to-end update attempt.
///
/// Owns the per-session cancellation token, the status monitor its commands
/// report into, and the command sequence. Single-use: [`run`](Self::run)
/// consumes the session.
pub struct UpdateSession {
    id: Uuid,
    target: VersionId,
    root: PathBuf,
    commands: Vec<Box<dyn AppUpdaterCommand>>,
    token: CancellationToken,
    monitor: StatusMonitor,
}

impl UpdateSession {
    /// The session's cancellation token.
    ///
    /// Cancelling it stops the in-flight command within one unit of work
    /// (one file, one chunk, one archive entry) and ends the session.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The monitor aggregating this session's progress.
    #[must_use]
    pub fn status_monitor(&self) -> StatusMonitor {
        self.monitor.clone()
    }

    /// The version this session installs.
    #[must_use]
    pub fn target_version(&self) -> VersionId {
        self.target
    }

    /// Whether the session has any work to do.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs the session: lock, prepare every command in order, then execute
    /// every command in order, stopping at the first failure.
    pub async fn run(mut self) -> Result<UpdateOutcome> {
        let _lock = SessionLock::acquire(&self.root).await?;

        if self.commands.is_empty() {
            info!(session = %self.id, version = %self.target, "already up to date");
            return Ok(UpdateOutcome::UpToDate(self.target));
        }

        info!(
            session = %self.id,
            version = %self.target,
            commands = self.commands.len(),
            "update session started"
        );

        for command in &mut self.commands {
            debug!(session = %self.id, command = command.name(), "preparing");
            command.prepare(&self.monitor).await?;
        }

        for command in &mut self.commands {
            debug!(session = %self.id, command = command.name(), "executing");
            command.execute(&self.token).await?;
        }

        info!(session = %self.id, version = %self.target, "update session completed");
        Ok(UpdateOutcome::Installed(self.target))
    }
}
