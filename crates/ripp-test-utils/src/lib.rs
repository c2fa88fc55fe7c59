//! Testing utilities for the RIPP workspace
//!
//! Shared fixtures, a scripted inference backend and a pinned clock.

#![allow(missing_docs)]

pub mod backend;
pub mod fixtures;
pub mod repo;

pub use backend::{ScriptStep, ScriptedBackend};
pub use fixtures::{
    candidate_json, candidate_set, evidence_pack, fixed_clock, fixed_time, response_for,
    response_for_level, section_content,
};
pub use repo::{write_sample_repo, SAMPLE_SECRET};
