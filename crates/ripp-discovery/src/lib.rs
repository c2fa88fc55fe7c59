//! RIPP Discovery - evidence-grounded candidate inference
//!
//! Turns an evidence pack into a set of unconfirmed intent candidates:
//! - One capability trait, [`InferenceBackend`], with remote, local and
//!   in-context adapters chosen by configuration
//! - A bounded retry loop that feeds validator findings back to the model
//! - Cooperative cancellation, distinct from validation failure
//! - A dual opt-in gate: configuration *and* runtime flag
//!
//! # Example
//!
//! ```rust
//! use ripp_core::AiConfig;
//! use ripp_discovery::ensure_ai_enabled;
//!
//! let ai = AiConfig { enabled: true, ..AiConfig::default() };
//! assert!(ensure_ai_enabled(&ai, false).is_err());
//! assert!(ensure_ai_enabled(&ai, true).is_ok());
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod backends;
pub mod engine;
pub mod error;
pub mod gate;
pub mod prompt;
pub mod response;
pub mod store;

pub use backend::{InferenceBackend, InferenceRequest};
pub use backends::{from_config, ApiKey, InContextBackend, OllamaBackend, OpenAiBackend};
pub use engine::{CandidateInferenceEngine, InferenceOptions, RetryPolicy};
pub use error::{BackendError, DiscoveryError};
pub use gate::{ensure_ai_enabled, runtime_enabled_from_env, AI_ENABLED_ENV};
pub use response::{Accepted, Rejection, ResponseRules};
pub use store::{load_candidates, write_candidates};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
