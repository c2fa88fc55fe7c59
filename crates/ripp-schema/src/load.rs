//! Document loading
//!
//! Format is chosen by extension: `.json` is JSON, anything else is YAML.
//! Loading only reads; the file is never touched.

use crate::error::LoadError;
use serde_json::Value;
use std::path::Path;

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl DocumentFormat {
    /// Format implied by a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse document text
///
/// # Errors
/// Returns the parser message on failure
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, String> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Read and parse a document from disk
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text, DocumentFormat::from_path(path)).map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}
