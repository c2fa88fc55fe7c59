//! RIPP Evidence - repository signal extraction
//!
//! Scans a file tree and emits a redacted, content-addressed
//! [`EvidencePack`](ripp_core::EvidencePack):
//! - include/exclude globs and a per-file size cutoff
//! - SHA-256 per file, category per file
//! - dependency, route, schema, auth and CI signals
//! - credential redaction before any snippet is kept
//! - coverage against the version-controlled file set
//!
//! Unreadable files are skipped and counted. Invalid settings fail before
//! the first filesystem access.
//!
//! # Example
//!
//! ```rust,ignore
//! use ripp_core::EvidenceConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let pack = ripp_evidence::build(root, &EvidenceConfig::default(), &CancellationToken::new()).await?;
//! println!("{} files, {}% covered", pack.stats.file_count, pack.stats.coverage_percent);
//! ```

#![warn(unreachable_pub)]

pub mod coverage;
pub mod error;
pub mod extractor;
pub mod redact;
mod signals;
pub mod store;

pub use error::EvidenceError;
pub use extractor::{build, EvidenceExtractor, ExtractionRules};
pub use redact::{Redacted, Redactor, MAX_SNIPPET_CHARS, REDACTED};
pub use store::{load_pack, write_pack};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
