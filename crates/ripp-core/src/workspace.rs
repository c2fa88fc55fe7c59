//! Workspace paths
//!
//! Every stage receives a [`Workspace`] explicitly; there is no process-wide
//! root.

use std::path::{Path, PathBuf};

/// Name of the state directory under the workspace root
pub const STATE_DIR: &str = ".ripp";

/// A workspace rooted at a repository directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create workspace for `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `.ripp` state directory
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Hand-authored configuration
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join("config.yaml")
    }

    /// Evidence pack directory
    #[must_use]
    pub fn evidence_dir(&self) -> PathBuf {
        self.state_dir().join("evidence")
    }

    /// Evidence pack index
    #[must_use]
    pub fn evidence_index_path(&self) -> PathBuf {
        self.evidence_dir().join("evidence.index.json")
    }

    /// Exchange directory for the in-context backend
    #[must_use]
    pub fn discovery_dir(&self) -> PathBuf {
        self.state_dir().join("discovery")
    }

    /// Candidate set
    #[must_use]
    pub fn candidates_path(&self) -> PathBuf {
        self.state_dir().join("intent.candidates.yaml")
    }

    /// Confirmation checklist
    #[must_use]
    pub fn checklist_path(&self) -> PathBuf {
        self.state_dir().join("intent.checklist.md")
    }

    /// Confirmation ledger
    #[must_use]
    pub fn confirmed_path(&self) -> PathBuf {
        self.state_dir().join("intent.confirmed.yaml")
    }

    /// Rejection export
    #[must_use]
    pub fn rejected_path(&self) -> PathBuf {
        self.state_dir().join("intent.rejected.yaml")
    }

    /// Compiled output directory
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.state_dir().join("output")
    }

    /// Compiled packet for `packet_id`
    #[must_use]
    pub fn packet_path(&self, packet_id: &str) -> PathBuf {
        self.output_dir().join(format!("{packet_id}.ripp.yaml"))
    }

    /// Human-readable summary for `packet_id`
    #[must_use]
    pub fn summary_path(&self, packet_id: &str) -> PathBuf {
        self.output_dir().join(format!("{packet_id}.summary.md"))
    }

    /// Root-relative display form of `path`, `/`-separated
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
