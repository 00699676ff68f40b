//! Test utilities for patchup.
//!
//! Fixtures and fakes shared by unit and integration tests: zip package
//! builders with matching content summaries, an in-memory remote source, a
//! scripted downloader, and a recorder for overall-status streams. Available
//! to integration tests behind the `test-utils` feature.

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeDownloader, StaticRemoteSource, StatusRecorder};
pub use fixtures::{PackageFixture, build_package, sha256_of};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initializes tracing for tests, once per process.
///
/// Respects `RUST_LOG` when set; otherwise uses the provided level, or stays
/// silent when neither is given.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
