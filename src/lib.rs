//! patchup - a client-side application updater.
//!
//! patchup brings a local installation directory to a target content version:
//! it downloads the version's package, verifies and stages it, then applies
//! it to the live installation while reporting weighted overall progress and
//! honoring cooperative cancellation.
//!
//! # Architecture Overview
//!
//! The core is the update orchestration pipeline:
//! - **Commands** ([`commands`]) are single-use units of work with a strict
//!   two-phase lifecycle: `prepare` registers weighted status reporters and
//!   fetches metadata, `execute` performs the mutation under a cancellation
//!   token.
//! - **Local state** ([`local`]) is the installation directory plus a
//!   persisted path → version metadata store, the single source of truth for
//!   what is installed. Mutation is gated behind an explicit write-access
//!   enable and an exclusive per-session lock file.
//! - **Status reporting** ([`status`]) aggregates the fractional progress of
//!   heterogeneous sub-operations (bytes downloaded, archive entries
//!   extracted, files copied) into one overall value via weights linear in
//!   each operation's cost.
//! - **Collaborators** ([`remote`], [`download`], [`archive`]) are narrow
//!   async traits with default HTTP/zip implementations; transport framing
//!   and archive codecs stay behind them.
//! - **The updater** ([`updater`]) selects a command sequence from the
//!   installed state and runs it as one session with one cancellation token
//!   and one status monitor.
//!
//! # Correctness Properties
//!
//! - Cancellation stops in-flight work within one unit (file, chunk, archive
//!   entry) and is a distinct terminal outcome, never conflated with failure.
//! - Staged package content lives in a scoped temporary directory removed on
//!   every exit path; no partially extracted package survives.
//! - Metadata is persisted per installed file, so an interrupted install
//!   leaves an accurate record of exactly the files that were applied (the
//!   documented partial-install boundary; recovery is resume or reinstall).
//! - Overall progress is the weighted mean of every reporter, recomputed
//!   synchronously under one lock on each update.
//!
//! # Example
//!
//! ```rust,no_run
//! use patchup::archive::ZipUnarchiver;
//! use patchup::download::ChunkedHttpDownloader;
//! use patchup::local::LocalData;
//! use patchup::remote::HttpRemoteSource;
//! use patchup::updater::{AppUpdater, UpdateOutcome};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let updater = AppUpdater::new(
//!     LocalData::open("/opt/my-app")?,
//!     Arc::new(HttpRemoteSource::new("https://content.example.com/app")),
//!     Arc::new(ChunkedHttpDownloader::new()),
//!     Arc::new(ZipUnarchiver::new()),
//! );
//!
//! let session = updater.session(None).await?;
//! match session.run().await? {
//!     UpdateOutcome::UpToDate(v) => println!("already on {v}"),
//!     UpdateOutcome::Installed(v) => println!("installed {v}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod commands;
pub mod core;
pub mod download;
pub mod local;
pub mod remote;
pub mod status;
pub mod updater;
pub mod utils;

// test_utils is available to unit tests and, behind the feature, to
// integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
