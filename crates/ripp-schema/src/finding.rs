//! Findings and reports

use ripp_core::Level;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory
    Warning,
    /// Fails the verdict
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One problem at a document path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// JSON pointer into the document (`/` for the root)
    pub path: String,
    /// Severity
    pub severity: Severity,
    /// Stable rule code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl Finding {
    /// Error finding
    pub fn error(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Error, code, message)
    }

    /// Warning finding
    pub fn warning(path: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Warning, code, message)
    }

    fn new(path: impl Into<String>, severity: Severity, code: &str, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            severity,
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Whether this finding fails a verdict
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {}", self.severity, self.code, self.path, self.message)
    }
}

/// Result of validating one document
///
/// Recomputed on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// All findings, structural first
    pub findings: Vec<Finding>,
    /// Level the document claimed (or the caller imposed)
    pub declared_level: Option<Level>,
    /// Highest level whose sections are fully present
    pub computed_level: Option<Level>,
}

impl ValidationReport {
    /// Pass verdict: no error findings
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }

    /// Error findings
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    /// Warning findings
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    /// Error messages joined one per line
    #[must_use]
    pub fn error_text(&self) -> String {
        self.errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
