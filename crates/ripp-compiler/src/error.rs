//! Error types for packet compilation

use ripp_core::{Diagnose, ErrorKind, HashError, Level, SectionName, StoreError};
use ripp_schema::{SchemaError, ValidationReport};

/// Compilation failure
///
/// Every variant is raised before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The ledger holds no confirmation run
    #[error("no confirmed intent to compile")]
    NoConfirmedIntent,

    /// The current run accepted nothing
    #[error("the current confirmation run accepted no candidate")]
    NothingAccepted,

    /// Two accepted decisions target one section
    #[error("section `{section}` was accepted twice (candidates {first} and {second})")]
    DuplicateSection {
        /// Contested section
        section: SectionName,
        /// Earlier candidate index
        first: usize,
        /// Later candidate index
        second: usize,
    },

    /// Accepted sections do not complete level one
    #[error("accepted sections do not reach level 1; missing {}", list(.missing))]
    BelowLevelOne {
        /// Level-one sections without an accepted decision
        missing: Vec<SectionName>,
    },

    /// Derived level is below the requested minimum
    #[error("derived level {derived} is below the required level {required}; missing {}", list(.missing))]
    LevelTooLow {
        /// Level the accepted sections reach
        derived: Level,
        /// Requested minimum
        required: Level,
        /// Sections needed for the minimum
        missing: Vec<SectionName>,
    },

    /// Identifier or title rejected before assembly
    #[error("invalid {field}: {reason}")]
    InvalidOption {
        /// Offending option
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Assembled packet failed validation; nothing was written
    #[error("compiled packet failed validation:\n{}", .report.error_text())]
    Validation {
        /// Full report
        report: ValidationReport,
    },

    /// Packet could not be converted for validation
    #[error("failed to encode packet: {0}")]
    Encode(#[from] serde_json::Error),

    /// Input hashing failed
    #[error("failed to hash accepted intent: {0}")]
    Hash(#[from] HashError),

    /// Embedded schemas failed to compile
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Reading the ledger or writing output failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn list(sections: &[SectionName]) -> String {
    sections
        .iter()
        .map(|s| format!("`{s}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Diagnose for CompileError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoConfirmedIntent | Self::NothingAccepted | Self::DuplicateSection { .. } => {
                ErrorKind::Conflict
            }
            Self::BelowLevelOne { .. }
            | Self::LevelTooLow { .. }
            | Self::Validation { .. }
            | Self::Encode(_)
            | Self::Hash(_) => ErrorKind::ValidationFailure,
            Self::InvalidOption { .. } | Self::Schema(_) => ErrorKind::Config,
            Self::Store(e) => e.kind(),
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::NoConfirmedIntent | Self::NothingAccepted => {
                Some("run `ripp confirm` and accept at least one candidate".into())
            }
            Self::DuplicateSection { .. } => {
                Some("re-run `ripp confirm` and reject one of the duplicates".into())
            }
            Self::BelowLevelOne { .. } | Self::LevelTooLow { .. } => Some(
                "accept candidates for the missing sections, or discover at a higher target level"
                    .into(),
            ),
            Self::InvalidOption { field: "identifier", .. } => {
                Some("use lowercase kebab-case, e.g. `user-login`".into())
            }
            Self::Validation { .. } => {
                Some("fix the accepted content with `ripp confirm --checklist`".into())
            }
            Self::Store(e) if e.is_not_found() => {
                Some("run `ripp confirm` to record decisions first".into())
            }
            Self::Store(e) => e.hint(),
            _ => None,
        }
    }
}
