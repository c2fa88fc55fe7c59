//! RIPP Core - intent packet data model
//!
//! Shared types for every pipeline stage:
//! - Canonical packets, sections and derived levels
//! - Evidence packs, candidates and the confirmation ledger
//! - SHA-256 content hashing
//! - Workspace layout, configuration and atomic persistence
//! - The error taxonomy every stage reports through
//!
//! # Example
//!
//! ```rust
//! use ripp_core::{Level, SectionName};
//!
//! let present = [SectionName::Purpose, SectionName::UxFlow, SectionName::DataContracts];
//! assert_eq!(Level::derive(|s| present.contains(&s)), Some(Level::One));
//! ```

#![warn(unreachable_pub)]

pub mod candidate;
pub mod clock;
pub mod config;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod intent;
pub mod io;
pub mod level;
pub mod packet;
pub mod workspace;

pub use candidate::{
    Candidate, CandidateSet, CandidateSource, Confidence, ConfidenceError, ConfirmationRequired,
    EvidenceRef, GeneratedBy, CANDIDATE_SET_VERSION,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AiConfig, ConfigError, DiscoveryConfig, EvidenceConfig, Provider, RippConfig};
pub use error::{Diagnose, ErrorKind};
pub use evidence::{
    AuthSignal, CiSignal, DependencyScope, DependencySignal, EvidencePack, EvidenceStats,
    FileCategory, FileEntry, RouteSignal, SchemaSignal, SignalGroups, SkippedFile,
    EVIDENCE_PACK_VERSION,
};
pub use hash::{ContentHash, HashError};
pub use intent::{ConfirmationMode, ConfirmationRun, Decision, IntentLedger, Verdict};
pub use io::StoreError;
pub use level::{Level, LevelError, SectionName};
pub use packet::{Packet, Provenance, Status, RIPP_VERSION};
pub use workspace::Workspace;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
