//! Error types for evidence extraction
//!
//! Individual unreadable files are not errors: they are skipped and counted
//! in the pack. Everything here is fatal to the extraction run.

use ripp_core::{ConfigError, Diagnose, ErrorKind, HashError, StoreError};
use std::path::PathBuf;

/// Fatal extraction errors
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// Extraction settings are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tree root is missing or not a directory
    #[error("cannot scan {path}: {reason}")]
    Root {
        /// Requested root
        path: PathBuf,
        /// Why it cannot be scanned
        reason: String,
    },

    /// The directory walk task failed
    #[error("directory walk failed: {0}")]
    Walk(String),

    /// Pack hashing failed
    #[error("failed to hash evidence pack: {0}")]
    Hash(#[from] HashError),

    /// Persisting the pack failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Cancelled between files
    #[error("evidence extraction cancelled")]
    Cancelled,
}

impl Diagnose for EvidenceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Root { .. } => ErrorKind::Config,
            Self::Walk(_) | Self::Hash(_) => ErrorKind::Extraction,
            Self::Store(e) => e.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.hint(),
            Self::Root { path, .. } => Some(format!("run from the repository root or check {}", path.display())),
            Self::Store(e) => e.hint(),
            Self::Cancelled => Some("re-run `ripp evidence build`; no partial pack was written".into()),
            Self::Walk(_) | Self::Hash(_) => None,
        }
    }
}
