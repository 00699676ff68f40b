//! Core types shared across the updater.
//!
//! This module hosts the pieces every other module leans on: the typed error
//! enum with its user-facing rendering, the cancellation primitives, and the
//! content version identifier.
//!
//! # Error Management
//!
//! The error system balances developer ergonomics with end-user experience:
//! - **Strongly-typed errors** ([`UpdaterError`]) for the failure kinds
//!   callers dispatch on, cancellation above all
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable
//!   suggestions for CLI users
//! - **Automatic conversion** from common standard library errors
//!
//! # Cancellation
//!
//! One [`CancellationToken`] per update session, checked cooperatively at
//! every safe suspension point via [`ensure_not_cancelled`].

pub mod cancel;
pub mod error;
pub mod version;

pub use cancel::{CancellationToken, ensure_not_cancelled};
pub use error::{ErrorContext, UpdaterError, is_cancellation, user_friendly_error};
pub use version::VersionId;
