//! The `status` subcommand.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Launcher;
use crate::local::InstalledState;

/// Show the installed state recorded in local metadata.
#[derive(Args)]
pub struct StatusCommand {
    /// List every installed file with its version.
    #[arg(long)]
    pub files: bool,
}

impl StatusCommand {
    pub async fn execute(self, launcher: &Launcher) -> Result<()> {
        let local = launcher.open_local()?;
        let metadata = local.metadata();

        match metadata.installed_state() {
            InstalledState::Empty => {
                println!("{} nothing is installed", "Status:".bold());
            }
            InstalledState::Version(version) => {
                println!(
                    "{} version {} ({} file(s))",
                    "Status:".bold(),
                    version.to_string().green(),
                    metadata.file_count()
                );
            }
            InstalledState::Mixed => {
                println!(
                    "{} {} ({} file(s)) - an update was interrupted; run 'patchup update'",
                    "Status:".bold(),
                    "mixed versions".yellow(),
                    metadata.file_count()
                );
            }
        }

        if self.files {
            for path in metadata.file_names() {
                let version =
                    metadata.file_version(&path).map(|v| v.to_string()).unwrap_or_default();
                println!("  {path} (v{version})");
            }
        }

        Ok(())
    }
}
