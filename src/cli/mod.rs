//! Command-line interface for patchup.
//!
//! Thin layer over the library: each subcommand builds an [`AppUpdater`]
//! (or just opens the local store) and renders outcomes and progress. All
//! orchestration semantics live in the library modules.
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - logging verbosity (mapped to `RUST_LOG`)
//! - `--no-progress` - disable progress bars (mapped to `PATCHUP_NO_PROGRESS`)
//! - `--root` - installation root (default: platform data dir, or
//!   `PATCHUP_ROOT`)
//! - `--remote` - base URL of the content source (or `PATCHUP_REMOTE`)

mod status;
mod uninstall;
mod update;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::ZipUnarchiver;
use crate::download::ChunkedHttpDownloader;
use crate::local::LocalData;
use crate::remote::HttpRemoteSource;
use crate::updater::AppUpdater;

/// Runtime configuration derived from the global CLI flags.
///
/// Holds the values that land in environment variables, so tests can build
/// and inspect a configuration without mutating global state.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for the `RUST_LOG` environment variable. `None` preserves
    /// an existing value.
    pub log_level: Option<String>,
    /// Whether to disable progress indicators (`PATCHUP_NO_PROGRESS`).
    pub no_progress: bool,
}

impl CliConfig {
    /// A configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies this configuration to the process environment.
    ///
    /// Call once at the start of execution, before other threads exist.
    pub fn apply_to_env(&self) {
        if let Some(level) = &self.log_level
            && std::env::var("RUST_LOG").is_err()
        {
            // SAFETY: runs on the main thread before the runtime spawns workers.
            unsafe { std::env::set_var("RUST_LOG", level) };
        }
        if self.no_progress {
            unsafe { std::env::set_var("PATCHUP_NO_PROGRESS", "1") };
        }
    }
}

/// Top-level CLI for the patchup updater.
#[derive(Parser)]
#[command(
    name = "patchup",
    about = "Client-side application updater",
    version,
    long_about = "patchup brings a local installation directory to a target content version: \
                  it downloads the version's package, verifies and stages it, then applies it \
                  atomically while reporting overall progress."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Installation root directory.
    #[arg(long, global = true, env = "PATCHUP_ROOT")]
    root: Option<PathBuf>,

    /// Base URL of the remote content source.
    #[arg(long, global = true, env = "PATCHUP_REMOTE")]
    remote: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the installation to the latest (or a specific) content version.
    Update(update::UpdateCommand),

    /// Show what is currently installed.
    Status(status::StatusCommand),

    /// Audit installed files against a version's content summary.
    Validate(validate::ValidateCommand),

    /// Remove every installed file and its metadata record.
    Uninstall(uninstall::UninstallCommand),
}

impl Cli {
    /// Executes the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig { log_level, no_progress: self.no_progress }
    }

    /// Executes with an injected configuration (used by tests).
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();
        init_logging();

        let launcher = Launcher { root: self.root, remote: self.remote };
        match self.command {
            Commands::Update(cmd) => cmd.execute(&launcher).await,
            Commands::Status(cmd) => cmd.execute(&launcher).await,
            Commands::Validate(cmd) => cmd.execute(&launcher).await,
            Commands::Uninstall(cmd) => cmd.execute(&launcher).await,
        }
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}

/// Resolved global options shared by the subcommands.
pub(crate) struct Launcher {
    root: Option<PathBuf>,
    remote: Option<String>,
}

impl Launcher {
    /// The installation root: the flag, or the platform data directory.
    pub(crate) fn root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("patchup"))
            .context("Cannot determine a data directory; pass --root")
    }

    /// The remote base URL; required by commands that talk to the source.
    pub(crate) fn remote_url(&self) -> Result<String> {
        self.remote
            .clone()
            .context("No remote content source configured; pass --remote or set PATCHUP_REMOTE")
    }

    /// Opens the local store without touching the network.
    pub(crate) fn open_local(&self) -> Result<LocalData> {
        LocalData::open(self.root()?)
    }

    /// Builds the full updater with the default collaborators.
    pub(crate) fn build_updater(&self) -> Result<AppUpdater> {
        let remote_url = self.remote_url()?;
        self.updater_with_remote(remote_url)
    }

    /// Builds an updater for commands that never contact the remote source,
    /// so `--remote` stays optional for them.
    pub(crate) fn build_local_updater(&self) -> Result<AppUpdater> {
        let remote_url = self.remote.clone().unwrap_or_else(|| "http://localhost".to_string());
        self.updater_with_remote(remote_url)
    }

    fn updater_with_remote(&self, remote_url: String) -> Result<AppUpdater> {
        let local = self.open_local()?;
        Ok(AppUpdater::new(
            local,
            Arc::new(HttpRemoteSource::new(remote_url)),
            Arc::new(ChunkedHttpDownloader::new()),
            Arc::new(ZipUnarchiver::new()),
        ))
    }
}
