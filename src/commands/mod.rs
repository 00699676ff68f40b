//! The polymorphic units of update work.
//!
//! Every command follows the same two-phase contract: `prepare` validates
//! inputs, fetches whatever version metadata it needs and registers its
//! weighted reporters against the session's status monitor without mutating
//! local state; `execute` performs the mutation against the session's
//! cancellation token. The phases run at most once each and strictly in
//! order, enforced by an explicit [`CommandLifecycle`] state machine rather
//! than convention.
//!
//! Commands:
//! - [`DownloadContentCommand`] - fetch and verify a version's package
//! - [`InstallContentCommand`] - stage a package and install its files
//! - [`UninstallCommand`] - remove every registered file
//! - [`ValidateIntegrityCommand`] - read-only audit against a summary

pub mod download_content;
pub mod install_content;
pub mod uninstall;
pub mod validate;

pub use download_content::DownloadContentCommand;
pub use install_content::InstallContentCommand;
pub use uninstall::UninstallCommand;
pub use validate::{FileIntegrity, IntegrityReport, ValidateIntegrityCommand};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::archive::Unarchiver;
use crate::core::{CancellationToken, UpdaterError, is_cancellation};
use crate::download::Downloader;
use crate::local::LocalData;
use crate::remote::RemoteSource;
use crate::status::StatusMonitor;

/// Collaborators shared by every command of one updater.
///
/// The local store sits behind an async mutex: commands run sequentially,
/// but each takes exclusive access for the span of its mutation so the
/// installed state is always observed consistently.
pub struct UpdateContext {
    /// The local installation, its metadata and directory layout.
    pub local: Mutex<LocalData>,
    /// Source of version metadata.
    pub remote: Arc<dyn RemoteSource>,
    /// Package downloader.
    pub downloader: Arc<dyn Downloader>,
    /// Package extractor.
    pub unarchiver: Arc<dyn Unarchiver>,
}

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Constructed, prepare not yet run.
    Created,
    /// Prepare succeeded; ready to execute.
    Prepared,
    /// Execute in progress.
    Executing,
    /// Execute finished successfully.
    Completed,
    /// Prepare or execute failed.
    Failed,
    /// Execute was stopped by the session's cancellation token.
    Cancelled,
}

impl CommandState {
    const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Prepared => "prepared",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Explicit state machine enforcing the two-phase command contract.
///
/// Created → Prepared → Executing → Completed | Failed | Cancelled.
/// Out-of-order calls fail with [`UpdaterError::InvalidCommandState`]
/// instead of silently re-running.
#[derive(Debug)]
pub struct CommandLifecycle {
    state: CommandState,
}

impl CommandLifecycle {
    /// A lifecycle in the `Created` state.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: CommandState::Created }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> CommandState {
        self.state
    }

    /// Validates that prepare may run. The state advances in
    /// [`finish_prepare`](Self::finish_prepare).
    pub fn begin_prepare(&mut self) -> Result<()> {
        if self.state != CommandState::Created {
            return Err(UpdaterError::InvalidCommandState {
                operation: "prepare",
                state: self.state.name(),
            }
            .into());
        }
        Ok(())
    }

    /// Records the outcome of the prepare phase.
    pub fn finish_prepare(&mut self, result: &Result<()>) {
        self.state = if result.is_ok() { CommandState::Prepared } else { CommandState::Failed };
    }

    /// Validates that execute may run and enters the `Executing` state.
    pub fn begin_execute(&mut self) -> Result<()> {
        if self.state != CommandState::Prepared {
            return Err(UpdaterError::InvalidCommandState {
                operation: "execute",
                state: self.state.name(),
            }
            .into());
        }
        self.state = CommandState::Executing;
        Ok(())
    }

    /// Records the outcome of the execute phase, distinguishing cancellation
    /// from failure.
    pub fn finish_execute(&mut self, result: &Result<()>) {
        self.state = match result {
            Ok(()) => CommandState::Completed,
            Err(e) if is_cancellation(e) => CommandState::Cancelled,
            Err(_) => CommandState::Failed,
        };
    }
}

impl Default for CommandLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-use unit of update work.
#[async_trait]
pub trait AppUpdaterCommand: Send {
    /// Short name for logs and status messages.
    fn name(&self) -> &'static str;

    /// Phase one: fetch metadata, compute weights, register reporters.
    ///
    /// Must not mutate local state beyond enabling write access. Runs at
    /// most once, before `execute`.
    async fn prepare(&mut self, monitor: &StatusMonitor) -> Result<()>;

    /// Phase two: perform the mutation.
    ///
    /// Checks `token` before every unbounded operation and once per file
    /// iteration. Runs at most once, after a successful `prepare`.
    async fn execute(&mut self, token: &CancellationToken) -> Result<()>;

    /// The command's lifecycle state.
    fn state(&self) -> CommandState;
}
