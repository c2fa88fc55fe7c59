//! RIPP Schema - validation and linting
//!
//! Every later pipeline stage depends on this crate:
//! - [`SchemaValidator`]: structural check against the embedded draft-7
//!   schema, then level conformance
//! - [`check_candidate`]: invariant checks over raw inference output
//! - [`quality_score`]: the weighted "good enough to confirm" heuristic
//! - [`LintEngine`]: best-practice advisories, optionally strict
//!
//! All checks are pure functions of their input.
//!
//! # Example
//!
//! ```rust
//! use ripp_schema::SchemaValidator;
//! use serde_json::json;
//!
//! let validator = SchemaValidator::new().unwrap();
//! let report = validator.validate(&json!({"level": 1}), None);
//! assert!(!report.passed());
//! ```

#![warn(unreachable_pub)]

pub mod candidate;
pub mod error;
pub mod finding;
pub mod lint;
pub mod load;
pub mod quality;
pub mod validator;

pub use candidate::{check_candidate, CONFIDENCE_RANGE_MESSAGE};
pub use error::{LoadError, SchemaError};
pub use finding::{Finding, Severity, ValidationReport};
pub use lint::{LintEngine, LintReport};
pub use load::{load_document, parse_document, DocumentFormat};
pub use quality::{check_quality, quality_score, DEFAULT_MIN_QUALITY, MIN_PROSE_LEN};
pub use validator::{SchemaValidator, PACKET_SCHEMA};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
