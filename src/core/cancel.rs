//! Cooperative cancellation support.
//!
//! One [`CancellationToken`] is created per update session and threaded
//! through every command and collaborator. Long-running work calls
//! [`ensure_not_cancelled`] at each safe point (before a download or
//! extraction starts, once per archive entry, once per file copy) so a
//! cancelled session stops within one unit of work and unwinds cleanly.

use anyhow::Result;

use crate::core::UpdaterError;

pub use tokio_util::sync::CancellationToken;

/// Returns the typed cancellation error when `token` has been cancelled.
///
/// Call sites stay one line and the resulting error is recognized by
/// [`is_cancellation`](crate::core::is_cancellation) everywhere downstream.
pub fn ensure_not_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(UpdaterError::Cancelled.into());
    }
    Ok(())
}
