//! Error types for candidate inference

use ripp_core::{ConfigError, Diagnose, ErrorKind, HashError, StoreError};
use ripp_schema::SchemaError;

/// Failure of one backend call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Backend cannot be reached or is not set up
    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        /// Provider name
        backend: String,
        /// What is missing
        reason: String,
    },

    /// Credentials were refused
    #[error("{backend} backend rejected the request (HTTP {status})")]
    Unauthorized {
        /// Provider name
        backend: String,
        /// HTTP status
        status: u16,
    },

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response
    #[error("server error {status}: {body}")]
    Server {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Response carried no completion text
    #[error("backend returned an empty response")]
    EmptyResponse,

    /// Exchange files could not be written
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Diagnose for BackendError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::Unauthorized { .. } => ErrorKind::BackendUnavailable,
            Self::Http(e) if e.is_timeout() || e.is_decode() => ErrorKind::ValidationFailure,
            Self::Http(_) => ErrorKind::BackendUnavailable,
            Self::Server { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::ValidationFailure
            }
            Self::Server { .. } => ErrorKind::BackendUnavailable,
            Self::EmptyResponse => ErrorKind::ValidationFailure,
            Self::Store(e) => e.kind(),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Unavailable { backend, .. } | Self::Unauthorized { backend, .. } => {
                Some(provider_hint(backend).to_string())
            }
            Self::Http(e) if e.is_connect() => {
                Some("check ai.endpoint and network access to the backend".into())
            }
            Self::Store(e) => e.hint(),
            _ => None,
        }
    }
}

fn provider_hint(backend: &str) -> &'static str {
    match backend {
        "openai" => "export OPENAI_API_KEY, or point ai.endpoint at a compatible server",
        "ollama" => "start `ollama serve` or set ai.endpoint to a reachable Ollama host",
        "in-context" => {
            "paste the model's JSON answer into .ripp/discovery/response.json and re-run `ripp discover`"
        }
        _ => "check the ai section of .ripp/config.yaml",
    }
}

/// Failure of an inference run
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Settings are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or both halves of the opt-in are missing
    #[error("AI discovery is disabled (config ai.enabled={config_enabled}, runtime flag={runtime_enabled})")]
    Disabled {
        /// `ai.enabled` in the configuration file
        config_enabled: bool,
        /// `--enable-ai` or `RIPP_AI_ENABLED`
        runtime_enabled: bool,
    },

    /// Backend failed in a way retrying cannot fix
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Every attempt produced invalid or low-quality output
    #[error("no valid candidates after {attempts} attempts; last failure: {last_failure}")]
    RetriesExhausted {
        /// Backend calls made
        attempts: u32,
        /// Feedback from the final attempt
        last_failure: String,
    },

    /// Cancelled between or during attempts
    #[error("candidate inference cancelled after {attempts} attempts")]
    Cancelled {
        /// Backend calls started
        attempts: u32,
    },

    /// Embedded schemas failed to compile
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Candidate set hashing failed
    #[error("failed to hash candidate set: {0}")]
    Hash(#[from] HashError),

    /// Reading the pack or writing the candidate set failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Diagnose for DiscoveryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Disabled { .. } | Self::Schema(_) => ErrorKind::Config,
            Self::Backend(e) => e.kind(),
            Self::RetriesExhausted { .. } => ErrorKind::ValidationFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Hash(_) => ErrorKind::Extraction,
            Self::Store(e) => e.kind(),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::RetriesExhausted { .. } => false,
            other => other.kind().is_retryable(),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.hint(),
            Self::Disabled {
                config_enabled,
                runtime_enabled,
            } => {
                let mut missing = Vec::new();
                if !config_enabled {
                    missing.push("set `ai.enabled: true` in .ripp/config.yaml");
                }
                if !runtime_enabled {
                    missing.push("pass --enable-ai or export RIPP_AI_ENABLED=true");
                }
                Some(missing.join(" and "))
            }
            Self::Backend(e) => e.hint(),
            Self::RetriesExhausted { .. } => Some(
                "raise ai.max_retries, lower discovery.target_level, or enrich the evidence pack"
                    .into(),
            ),
            Self::Store(e) if e.is_not_found() => {
                Some("run `ripp evidence build` first".into())
            }
            Self::Store(e) => e.hint(),
            Self::Cancelled { .. } | Self::Schema(_) | Self::Hash(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_hint_names_each_missing_half() {
        let both = DiscoveryError::Disabled {
            config_enabled: false,
            runtime_enabled: false,
        };
        let hint = both.hint().unwrap();
        assert!(hint.contains("ai.enabled"));
        assert!(hint.contains("--enable-ai"));

        let runtime_only = DiscoveryError::Disabled {
            config_enabled: true,
            runtime_enabled: false,
        };
        assert!(!runtime_only.hint().unwrap().contains("ai.enabled"));
    }

    #[test]
    fn exhaustion_is_a_validation_failure_but_final() {
        let err = DiscoveryError::RetriesExhausted {
            attempts: 3,
            last_failure: "x".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert!(!err.is_retryable());
    }

    #[test]
    fn backend_classification() {
        let server = BackendError::Server {
            status: 503,
            body: String::new(),
        };
        assert!(server.is_retryable());
        let bad_request = BackendError::Server {
            status: 400,
            body: String::new(),
        };
        assert_eq!(bad_request.kind(), ErrorKind::BackendUnavailable);
        assert!(BackendError::EmptyResponse.is_retryable());
        let unauthorized = BackendError::Unauthorized {
            backend: "openai".into(),
            status: 401,
        };
        assert!(!unauthorized.is_retryable());
        assert!(unauthorized.hint().unwrap().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn cancellation_is_distinct() {
        let err = DiscoveryError::Cancelled { attempts: 1 };
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!err.is_retryable());
    }
}
