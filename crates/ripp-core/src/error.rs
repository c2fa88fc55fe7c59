//! Error taxonomy shared by every pipeline stage
//!
//! Each crate defines its own error enum and classifies it through
//! [`Diagnose`], so callers can decide on retry and print a remediation hint
//! without matching on crate-specific variants.

use std::fmt::{self, Display, Formatter};

/// Failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed configuration; fatal before any I/O
    Config,
    /// Individual file unreadable; recovered by skipping
    Extraction,
    /// Inference backend unreachable or unauthorized
    BackendUnavailable,
    /// Structural or quality check failed
    ValidationFailure,
    /// Cooperative cancellation
    Cancelled,
    /// Malformed or duplicate human input
    Conflict,
    /// Persistence failure
    Io,
}

impl ErrorKind {
    /// Whether an operation failing with this kind may be attempted again
    ///
    /// Only validation failures are retried, and only inside the inference
    /// loop.
    #[inline]
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ValidationFailure)
    }

    /// Short label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Extraction => "extraction",
            Self::BackendUnavailable => "backend-unavailable",
            Self::ValidationFailure => "validation-failure",
            Self::Cancelled => "cancelled",
            Self::Conflict => "conflict",
            Self::Io => "io",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification implemented by every stage error
pub trait Diagnose: std::error::Error {
    /// Failure class
    fn kind(&self) -> ErrorKind;

    /// Whether retrying may succeed
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Remediation text for the user
    fn hint(&self) -> Option<String> {
        None
    }
}
