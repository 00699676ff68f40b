//! Weighted progress reporting.
//!
//! Heterogeneous sub-operations (downloading bytes, unarchiving entries,
//! copying files) each feed a leaf reporter carrying a relative cost weight;
//! the [`StatusMonitor`] folds them into a single overall fraction and
//! republishes it to scoped subscribers on every change.
//!
//! - [`weight`] computes the relative cost weights (pure functions)
//! - [`reporter`] holds the leaf reporter handles commands write to
//! - [`monitor`] aggregates and publishes, serialized under one lock

pub mod monitor;
pub mod reporter;
pub mod weight;

pub use monitor::{DownloadStatus, OverallStatus, StatusMonitor, StatusSubscription};
pub use reporter::{DownloadStatusReporter, GeneralStatusReporter};
