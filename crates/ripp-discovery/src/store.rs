//! Candidate set persistence

use ripp_core::io::{read_yaml, write_yaml_atomic};
use ripp_core::{CandidateSet, StoreError, Workspace};

/// Write the candidate set to `.ripp/intent.candidates.yaml`
///
/// # Errors
/// Returns error on encode or write failure
pub fn write_candidates(workspace: &Workspace, set: &CandidateSet) -> Result<(), StoreError> {
    let path = workspace.candidates_path();
    write_yaml_atomic(&path, set)?;
    tracing::info!(path = %workspace.relative(&path), candidates = set.len(), "wrote candidate set");
    Ok(())
}

/// Load the candidate set
///
/// # Errors
/// Returns error if the file is missing or malformed
pub fn load_candidates(workspace: &Workspace) -> Result<CandidateSet, StoreError> {
    read_yaml(&workspace.candidates_path())
}
