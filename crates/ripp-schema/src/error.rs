//! Error types for schema validation and document loading

use ripp_core::{Diagnose, ErrorKind};
use std::path::PathBuf;

/// The embedded schema failed to compile
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Embedded schema is not valid JSON
    #[error("embedded schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema compilation failed
    #[error("schema compilation failed: {0}")]
    Compile(String),
}

impl Diagnose for SchemaError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}

/// A document could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML or JSON
    #[error("cannot parse {path}: {message}")]
    Parse {
        /// Document path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl Diagnose for LoadError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::ValidationFailure,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Io { path, .. } => Some(format!("check that {} exists", path.display())),
            Self::Parse { .. } => Some("documents must be YAML (.yaml/.yml) or JSON (.json)".into()),
        }
    }
}
