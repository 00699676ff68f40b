//! The `update` subcommand.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Launcher;
use crate::core::VersionId;
use crate::status::OverallStatus;
use crate::updater::UpdateOutcome;
use crate::utils::progress::{OVERALL_BAR_UNITS, ProgressBar, human_bytes};

/// Bring the installation to a target content version.
#[derive(Args)]
pub struct UpdateCommand {
    /// Target version id (defaults to the remote's latest).
    #[arg(long)]
    pub version: Option<u32>,
}

impl UpdateCommand {
    pub async fn execute(self, launcher: &Launcher) -> Result<()> {
        let updater = launcher.build_updater()?;
        let session = updater.session(self.version.map(VersionId::new)).await?;
        let target = session.target_version();

        if session.is_up_to_date() {
            println!("{} version {target} is already installed", "Up to date:".green().bold());
            return Ok(());
        }

        // Ctrl-C cancels the session cooperatively; the command in flight
        // stops within one unit of work and cleans up its staging state.
        let token = session.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        let bar = ProgressBar::new(OVERALL_BAR_UNITS);
        bar.set_prefix("Updating");
        let bar_handle = bar.clone();
        let monitor = session.status_monitor();
        let _subscription = monitor.subscribe(move |status: &OverallStatus| {
            bar_handle.set_position((status.progress * OVERALL_BAR_UNITS as f64) as u64);
            if let Some(download) = &status.download {
                bar_handle.set_message(format!(
                    "{} / {} ({}/s)",
                    human_bytes(download.downloaded_bytes),
                    human_bytes(download.total_bytes),
                    human_bytes(download.bytes_per_second as u64),
                ));
            }
        });

        match session.run().await {
            Ok(UpdateOutcome::Installed(version)) => {
                bar.finish_and_clear();
                println!("{} version {version} installed", "Success:".green().bold());
                Ok(())
            }
            Ok(UpdateOutcome::UpToDate(version)) => {
                bar.finish_and_clear();
                println!("{} version {version} is already installed", "Up to date:".green().bold());
                Ok(())
            }
            Err(e) => {
                bar.finish_and_clear();
                Err(e)
            }
        }
    }
}
