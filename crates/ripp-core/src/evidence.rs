//! Evidence pack model
//!
//! An immutable snapshot of one extraction run. A new run replaces the pack
//! wholesale.

use crate::hash::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Evidence pack format version
pub const EVIDENCE_PACK_VERSION: &str = "1.0";

/// File classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Dependency manifest
    Manifest,
    /// Contains route registrations
    Route,
    /// Data schema or ORM model
    Schema,
    /// Authentication logic
    Auth,
    /// Continuous integration definition
    Ci,
    /// Other source code
    Source,
    /// Configuration file
    Config,
    /// Documentation
    Doc,
    /// Anything else
    Other,
}

/// One indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Root-relative path with `/` separators
    pub path: String,
    /// SHA-256 of file bytes
    pub hash: ContentHash,
    /// Size in bytes
    pub size: u64,
    /// Line count; zero for binary files
    #[serde(default)]
    pub lines: u32,
    /// Classification
    pub category: FileCategory,
}

/// Dependency scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyScope {
    /// Needed at runtime
    Runtime,
    /// Build or test only
    Dev,
}

/// Dependency declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencySignal {
    /// Manifest path
    pub file: String,
    /// Package ecosystem (npm, cargo, pypi, go)
    pub ecosystem: String,
    /// Package name
    pub name: String,
    /// Version requirement, redacted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Runtime or dev
    pub scope: DependencyScope,
    /// Whether redaction changed the version text
    pub redacted: bool,
}

/// Route registration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteSignal {
    /// Source path
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// HTTP method when the idiom names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Route path
    pub path: String,
    /// Idiom that matched (express, flask, ...)
    pub framework: String,
    /// Redacted excerpt
    pub snippet: String,
    /// Whether redaction changed the excerpt
    pub redacted: bool,
}

/// Data schema definition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaSignal {
    /// Source path
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// Entity name
    pub name: String,
    /// Idiom that matched (prisma, sql, ...)
    pub kind: String,
    /// Redacted excerpt
    pub snippet: String,
    /// Whether redaction changed the excerpt
    pub redacted: bool,
}

/// Authentication idiom
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthSignal {
    /// Source path
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// Mechanism (jwt, oauth, session, ...)
    pub mechanism: String,
    /// Redacted excerpt
    pub snippet: String,
    /// Whether redaction changed the excerpt
    pub redacted: bool,
}

/// Continuous integration workflow
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiSignal {
    /// Workflow path
    pub file: String,
    /// Trigger names
    pub triggers: Vec<String>,
    /// Job names
    pub jobs: Vec<String>,
    /// Whether redaction changed any name
    pub redacted: bool,
}

/// Extracted signal groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalGroups {
    /// Manifest dependencies
    pub dependencies: Vec<DependencySignal>,
    /// Route definitions
    pub routes: Vec<RouteSignal>,
    /// Schema definitions
    pub schemas: Vec<SchemaSignal>,
    /// Authentication signals
    pub auth: Vec<AuthSignal>,
    /// CI configuration
    pub ci: Vec<CiSignal>,
}

impl SignalGroups {
    /// Total signal count
    #[must_use]
    pub fn total(&self) -> usize {
        self.dependencies.len()
            + self.routes.len()
            + self.schemas.len()
            + self.auth.len()
            + self.ci.len()
    }

    /// Sort every group so output is independent of walk order
    pub fn sort(&mut self) {
        self.dependencies.sort();
        self.routes.sort();
        self.schemas.sort();
        self.auth.sort();
        self.ci.sort();
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceStats {
    /// Files indexed
    pub file_count: usize,
    /// Bytes indexed
    pub total_size: u64,
    /// Size of the version-controlled file set
    pub tracked_file_count: usize,
    /// Share of tracked files that were indexed, in percent
    pub coverage_percent: f64,
    /// Files filtered out by include/exclude globs
    pub excluded_count: usize,
    /// Files above the size cutoff
    pub oversized_count: usize,
    /// Files that could not be read
    pub unreadable_count: usize,
}

/// A file skipped because it could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Root-relative path
    pub path: String,
    /// Failure description
    pub reason: String,
}

/// Redacted, content-addressed index of repository signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePack {
    /// Format version
    pub version: String,
    /// Extraction time
    pub created: DateTime<Utc>,
    /// Hash over files, signals and stats
    pub pack_hash: ContentHash,
    /// Summary statistics
    pub stats: EvidenceStats,
    /// File index, sorted by path
    pub files: Vec<FileEntry>,
    /// Signal groups
    pub signals: SignalGroups,
    /// Unreadable files
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
}
