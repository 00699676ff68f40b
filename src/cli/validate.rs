//! The `validate` subcommand.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use super::Launcher;
use crate::commands::{AppUpdaterCommand, ValidateIntegrityCommand};
use crate::core::{CancellationToken, VersionId};
use crate::local::InstalledState;
use crate::status::StatusMonitor;

/// Audit installed files against a version's content summary.
#[derive(Args)]
pub struct ValidateCommand {
    /// Version to validate against (defaults to the installed version).
    #[arg(long)]
    pub version: Option<u32>,
}

impl ValidateCommand {
    pub async fn execute(self, launcher: &Launcher) -> Result<()> {
        let updater = launcher.build_updater()?;
        let context = updater.context();

        let version = match self.version {
            Some(version) => VersionId::new(version),
            None => match context.local.lock().await.metadata().installed_state() {
                InstalledState::Version(version) => version,
                InstalledState::Empty => bail!("Nothing is installed; nothing to validate"),
                InstalledState::Mixed => bail!(
                    "Installed files carry mixed versions; pass --version to pick the one to audit"
                ),
            },
        };

        let monitor = StatusMonitor::new();
        let token = CancellationToken::new();
        let mut command = ValidateIntegrityCommand::new(version, context);
        command.prepare(&monitor).await.context("Failed to prepare the integrity audit")?;
        command.execute(&token).await?;

        let report = command.report();
        if report.is_valid() {
            println!(
                "{} all {} file(s) of version {version} are intact",
                "Valid:".green().bold(),
                report.entries.len()
            );
            return Ok(());
        }

        for (path, status) in report.problems() {
            println!("  {} {path}: {status}", "✗".red());
        }
        bail!("Integrity check against version {version} failed");
    }
}
