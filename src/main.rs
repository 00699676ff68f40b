//! patchup CLI entry point.
//!
//! Parses the command line, runs the selected subcommand, and renders
//! failures as user-friendly messages with suggestions:
//! - `update` - bring the installation to a target content version
//! - `status` - show what is currently installed
//! - `validate` - audit installed files against a version's summary
//! - `uninstall` - remove every installed file

use anyhow::Result;
use clap::Parser;
use patchup::cli;
use patchup::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
