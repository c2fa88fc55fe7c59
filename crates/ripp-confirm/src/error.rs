//! Error types for confirmation

use ripp_core::{ContentHash, Diagnose, ErrorKind, HashError, StoreError};
use ripp_schema::SchemaError;

/// One unparseable checklist block
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}{}: {message}", block_label(.block))]
pub struct BlockError {
    /// Block number as written in its heading, when known
    pub block: Option<usize>,
    /// 1-based line the problem was found on
    pub line: usize,
    /// What is wrong
    pub message: String,
}

fn block_label(block: &Option<usize>) -> String {
    block.map(|n| format!(", block {n}")).unwrap_or_default()
}

/// Every block error of one checklist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summary(.errors))]
pub struct ChecklistError {
    /// Offending blocks, in document order
    pub errors: Vec<BlockError>,
}

fn summary(errors: &[BlockError]) -> String {
    let mut text = format!("checklist has {} problem(s); nothing was recorded", errors.len());
    for error in errors {
        text.push_str("\n  ");
        text.push_str(&error.to_string());
    }
    text
}

impl Diagnose for ChecklistError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Conflict
    }

    fn hint(&self) -> Option<String> {
        Some("tick exactly one of accept/reject per block and keep headings as `## <n>. <section>`".into())
    }
}

/// Failure of a confirmation run
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Checklist blocks could not be parsed
    #[error(transparent)]
    Checklist(#[from] ChecklistError),

    /// The run recorded no decision
    #[error("no candidate was accepted or rejected; nothing was recorded")]
    NoDecisions,

    /// Candidate set has nothing to confirm
    #[error("candidate set is empty")]
    EmptyCandidateSet,

    /// Checklist was generated for a different candidate set
    #[error("checklist was generated for candidate set {found}, current set is {expected}")]
    StaleChecklist {
        /// Current candidate set hash
        expected: ContentHash,
        /// Hash recorded in the checklist
        found: String,
    },

    /// Checklist lost its candidate set line
    #[error("checklist has no `Candidate set:` line, so it cannot be matched to candidate set {expected}")]
    UnstampedChecklist {
        /// Current candidate set hash
        expected: ContentHash,
    },

    /// Prompt I/O failed
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    /// Reading or writing ledger files failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Candidate set hashing failed
    #[error("failed to hash candidate set: {0}")]
    Hash(#[from] HashError),

    /// Embedded schemas failed to compile
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl Diagnose for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Checklist(e) => e.kind(),
            Self::NoDecisions | Self::StaleChecklist { .. } | Self::UnstampedChecklist { .. } => {
                ErrorKind::Conflict
            }
            Self::EmptyCandidateSet | Self::Schema(_) => ErrorKind::Config,
            Self::Prompt(_) => ErrorKind::Io,
            Self::Store(e) => e.kind(),
            Self::Hash(_) => ErrorKind::ValidationFailure,
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Checklist(e) => e.hint(),
            Self::NoDecisions => Some("accept or reject at least one candidate".into()),
            Self::EmptyCandidateSet => Some("run `ripp discover` to produce candidates".into()),
            Self::StaleChecklist { .. } | Self::UnstampedChecklist { .. } => {
                Some("regenerate the checklist with `ripp confirm --checklist`".into())
            }
            Self::Store(e) if e.is_not_found() => {
                Some("run `ripp discover` (or `ripp confirm --checklist`) first".into())
            }
            Self::Store(e) => e.hint(),
            Self::Prompt(_) | Self::Hash(_) | Self::Schema(_) => None,
        }
    }
}
