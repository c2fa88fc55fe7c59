//! Pack persistence
//!
//! The index holds the whole pack; each signal group is also written to its
//! own extract so reviewers can read one category at a time. A new pack
//! replaces every file.

use ripp_core::io::{read_json, write_json_atomic};
use ripp_core::{EvidencePack, StoreError, Workspace};

/// Write the pack index and per-group extracts
///
/// # Errors
/// Returns error if any file cannot be written
pub fn write_pack(workspace: &Workspace, pack: &EvidencePack) -> Result<(), StoreError> {
    let dir = workspace.evidence_dir();
    let signals = &pack.signals;
    write_json_atomic(&dir.join("dependencies.json"), &signals.dependencies)?;
    write_json_atomic(&dir.join("routes.json"), &signals.routes)?;
    write_json_atomic(&dir.join("schemas.json"), &signals.schemas)?;
    write_json_atomic(&dir.join("auth.json"), &signals.auth)?;
    write_json_atomic(&dir.join("ci.json"), &signals.ci)?;
    // Index last: its presence marks a complete pack
    write_json_atomic(&workspace.evidence_index_path(), pack)?;
    tracing::info!(path = %workspace.evidence_index_path().display(), "evidence pack written");
    Ok(())
}

/// Read the pack index
///
/// # Errors
/// Returns error if the index is missing or malformed
pub fn load_pack(workspace: &Workspace) -> Result<EvidencePack, StoreError> {
    read_json(&workspace.evidence_index_path())
}
