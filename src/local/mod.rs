//! The local installation: its directory layout, metadata store, and lock.
//!
//! [`LocalData`] owns the on-disk layout rooted at one directory and gates
//! all mutation behind an explicit write-access enable. [`LocalMetaData`] is
//! the persisted path → version record, the single source of truth for what
//! is installed. [`SessionLock`] gives an update session exclusive ownership
//! of the root for its duration.

pub mod data;
pub mod lock;
pub mod metadata;

pub use data::{LocalData, TemporaryDirectory};
pub use lock::SessionLock;
pub use metadata::{InstalledFile, InstalledState, LocalMetaData};
