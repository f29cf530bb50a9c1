//! Error types for the otp-extract crate.
//!
//! Extraction itself never fails: a message without a code yields `None`.
//! The errors below cover the fallible edges around it, namely configuration,
//! custom patterns, MIME parsing and lookup arguments.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the extraction engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// A custom matcher pattern failed to compile.
    #[error("invalid pattern: {pattern}")]
    InvalidPattern {
        /// The pattern that was rejected.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Mailbox argument is not a valid email address.
    #[error("invalid mailbox address: {address}")]
    InvalidMailbox {
        /// The rejected address.
        address: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Email parsing errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse email message.
    #[error("failed to parse email")]
    ParseEmail {
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },
}

impl Error {
    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidMailbox { .. } => ErrorCategory::Configuration,

            Error::ParseEmail { .. } => ErrorCategory::Parse,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or argument validation errors.
    Configuration,
    /// Email parsing errors.
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Parse => write!(f, "parse"),
        }
    }
}
