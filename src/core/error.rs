//! Error handling for patchup
//!
//! This module provides the typed error enum and user-friendly error reporting
//! for the updater. The error system is designed around two principles:
//! 1. **Strongly-typed errors** for the failure kinds callers dispatch on
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! Two main types:
//! - [`UpdaterError`] - Enumerated error types for all updater failure cases
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Most functions return [`anyhow::Result`]; typed variants are raised with
//! `bail!`/`anyhow!` and recovered with `downcast_ref` where the kind matters.
//! The one kind that always matters is cancellation: [`UpdaterError::Cancelled`]
//! is a distinct terminal outcome, not a failure, and [`is_cancellation`] tells
//! the two apart anywhere in the chain.
//!
//! # Error Categories
//!
//! - **Precondition violations**: [`UpdaterError::InvalidCommandState`],
//!   [`UpdaterError::InstallationNotEmpty`], [`UpdaterError::WriteAccessRequired`]
//! - **Integrity errors**: [`UpdaterError::MissingPackageFile`],
//!   [`UpdaterError::ChecksumMismatch`], [`UpdaterError::InvalidPackage`],
//!   [`UpdaterError::UnsafeArchivePath`]
//! - **Transport errors**: [`UpdaterError::NetworkError`],
//!   [`UpdaterError::VersionNotFound`]
//! - **Cancellation**: [`UpdaterError::Cancelled`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use patchup::core::{UpdaterError, user_friendly_error};
//!
//! fn run_update() -> anyhow::Result<()> {
//!     Err(UpdaterError::VersionNotFound { version: 9 }.into())
//! }
//!
//! if let Err(e) = run_update() {
//!     let ctx = user_friendly_error(e);
//!     ctx.display(); // Colored error with a suggestion
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for updater operations
///
/// Each variant represents a specific failure mode with enough context to
/// produce an actionable message. Variants map to the failure taxonomy the
/// rest of the crate is written against: precondition violations abort a
/// command immediately, integrity errors require a fresh package, transport
/// errors are terminal for the attempt, and cancellation is a distinct
/// outcome rather than a failure.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// A command method was called out of lifecycle order
    ///
    /// Commands move through Created → Prepared → Executing → terminal
    /// states; calling `prepare` or `execute` twice, or `execute` before
    /// `prepare`, is a programming error surfaced as this variant.
    #[error("cannot {operation}: command is already {state}")]
    InvalidCommandState {
        /// The method that was called (e.g. "prepare", "execute")
        operation: &'static str,
        /// The lifecycle state the command was found in
        state: &'static str,
    },

    /// A full-content install was attempted over a non-empty installation
    ///
    /// Full-content installs must only run against an empty local store; the
    /// update strategy schedules an uninstall first when files are recorded.
    #[error("cannot install full content over an existing installation ({file_count} file(s) already recorded)")]
    InstallationNotEmpty {
        /// Number of files currently recorded in local metadata
        file_count: usize,
    },

    /// A mutating operation ran before write access was enabled
    #[error("write access to local data has not been enabled (operation: {operation})")]
    WriteAccessRequired {
        /// The mutating operation that was attempted
        operation: String,
    },

    /// A file listed by the content summary is absent from the staged package
    ///
    /// The package is inconsistent with its declared summary; a fresh
    /// download is required. Never retried.
    #[error("Cannot find file '{path}' in content package")]
    MissingPackageFile {
        /// Relative path that the summary lists but the package lacks
        path: String,
    },

    /// File integrity verification failed
    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Human-readable name of the file that failed verification
        name: String,
        /// The expected checksum value
        expected: String,
        /// The actual computed checksum value
        actual: String,
    },

    /// The content package cannot be read as an archive
    #[error("Invalid content package: {reason}")]
    InvalidPackage {
        /// Why the package was rejected
        reason: String,
    },

    /// An archive entry would extract outside the staging directory
    #[error("Archive entry '{entry}' escapes the extraction directory")]
    UnsafeArchivePath {
        /// The offending entry name as stored in the archive
        entry: String,
    },

    /// A relative path failed validation before being joined under a root
    #[error("Relative path '{path}' is not safe: {reason}")]
    InvalidRelativePath {
        /// The rejected path
        path: String,
        /// Which rule it violated
        reason: &'static str,
    },

    /// The remote source does not know the requested version
    #[error("Version {version} not found on the remote source")]
    VersionNotFound {
        /// The version id that was requested
        version: u32,
    },

    /// A network operation failed
    #[error("Network error during {operation}: {reason}")]
    NetworkError {
        /// The operation that failed (e.g. "download package", "fetch summary")
        operation: String,
        /// Underlying cause, already rendered
        reason: String,
    },

    /// The update was cancelled through the session's cancellation token
    ///
    /// A terminal outcome, not a failure. Checked with [`is_cancellation`]
    /// so callers can distinguish resume/restart from error handling.
    #[error("Update cancelled")]
    Cancelled,

    /// Local metadata could not be parsed
    #[error("Invalid metadata file syntax in {file}")]
    MetadataParseError {
        /// Path of the unreadable metadata file
        file: String,
        /// Parser diagnostic
        reason: String,
    },

    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

/// Returns `true` when the error chain bottoms out in [`UpdaterError::Cancelled`].
///
/// Cancellation travels through the same `anyhow` chains as real failures but
/// must stay distinguishable: callers resume or restart after cancellation,
/// while failures need a fresh package or operator attention.
#[must_use]
pub fn is_cancellation(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<UpdaterError>(), Some(UpdaterError::Cancelled))
}

/// Error context wrapper providing user-friendly messages
///
/// Wraps any error with an optional suggestion and details for CLI display.
/// The [`display`](Self::display) method prints a colored, structured message
/// to stderr; the [`fmt::Display`] impl renders the same text uncolored.
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from any error type
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self { error: error.into(), suggestion: None, details: None }
    }

    /// Add a suggestion for how the user can resolve the error
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details about the error
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors and structure
    pub fn display(&self) {
        eprintln!("{} {}", "Error:".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("\n{} {}", "Details:".yellow().bold(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("\n{} {}", "Suggestion:".green().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorContext")
            .field("error", &self.error)
            .field("suggestion", &self.suggestion)
            .field("details", &self.details)
            .finish()
    }
}

/// Convert any error into a user-friendly [`ErrorContext`] with suggestions.
///
/// Inspects the error chain for known [`UpdaterError`] variants and attaches
/// a resolution hint for the ones a user can act on. Unknown errors pass
/// through without a suggestion.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = match error.downcast_ref::<UpdaterError>() {
        Some(UpdaterError::InstallationNotEmpty { .. }) => Some(
            "Run 'patchup uninstall' first, or let 'patchup update' pick the reinstall strategy"
                .to_string(),
        ),
        Some(UpdaterError::ChecksumMismatch { .. } | UpdaterError::MissingPackageFile { .. }) => {
            Some(
                "The downloaded package is corrupt or incomplete; re-run the update to fetch it again"
                    .to_string(),
            )
        }
        Some(UpdaterError::InvalidPackage { .. } | UpdaterError::UnsafeArchivePath { .. }) => {
            Some("The content package is malformed; report this to the content publisher".to_string())
        }
        Some(UpdaterError::VersionNotFound { version }) => {
            Some(format!("Check that version {version} has been published to the remote source"))
        }
        Some(UpdaterError::NetworkError { .. }) => {
            Some("Check your internet connection and that the remote URL is reachable".to_string())
        }
        Some(UpdaterError::Cancelled) => {
            Some("Run 'patchup update' again to resume the update".to_string())
        }
        Some(UpdaterError::MetadataParseError { file, .. }) => {
            Some(format!("The metadata file {file} is damaged; validate or reinstall the app"))
        }
        Some(UpdaterError::WriteAccessRequired { .. }) => {
            Some("Check the permissions of the installation directory".to_string())
        }
        _ => None,
    };

    let ctx = ErrorContext::new(error);
    match suggestion {
        Some(s) => ctx.with_suggestion(s),
        None => ctx,
    }
}
