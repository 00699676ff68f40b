//! The `uninstall` subcommand.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Launcher;
use crate::commands::{self, AppUpdaterCommand};
use crate::core::CancellationToken;
use crate::status::StatusMonitor;

/// Remove every installed file and its metadata record.
#[derive(Args)]
pub struct UninstallCommand {}

impl UninstallCommand {
    pub async fn execute(self, launcher: &Launcher) -> Result<()> {
        let updater = launcher.build_local_updater()?;
        let file_count = updater.context().local.lock().await.metadata().file_count();
        if file_count == 0 {
            println!("{} nothing is installed", "Uninstall:".bold());
            return Ok(());
        }

        let monitor = StatusMonitor::new();
        let token = CancellationToken::new();
        let mut command = commands::UninstallCommand::new(updater.context());
        command.prepare(&monitor).await?;
        command.execute(&token).await?;

        println!("{} removed {file_count} file(s)", "Uninstall:".green().bold());
        Ok(())
    }
}
