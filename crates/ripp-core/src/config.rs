//! Workspace configuration
//!
//! `.ripp/config.yaml` is the only hand-authored file in the workspace. A
//! missing file yields defaults; a present but malformed one is fatal before
//! any other I/O.

use crate::error::{Diagnose, ErrorKind};
use crate::level::Level;
use crate::packet::RIPP_VERSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default per-file size cutoff (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File exists but cannot be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML for this schema
    #[error("malformed config {path}: {message}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field path
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Construct an `Invalid` error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl Diagnose for ConfigError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }

    fn hint(&self) -> Option<String> {
        Some(match self {
            Self::Io { path, .. } => format!("check permissions on {}", path.display()),
            Self::Parse { path, .. } => format!(
                "fix the YAML in {}; unknown keys are rejected",
                path.display()
            ),
            Self::Invalid { field, .. } => format!("correct `{field}` in .ripp/config.yaml"),
        })
    }
}

/// Inference provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// OpenAI-compatible chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama server
    #[serde(rename = "ollama")]
    Ollama,
    /// Exchange files answered by an interactive assistant
    #[serde(rename = "in-context")]
    InContext,
}

impl Provider {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::InContext => "in-context",
        }
    }
}

/// Evidence extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvidenceConfig {
    /// Globs a file must match; empty means everything
    pub include_globs: Vec<String>,
    /// Globs that exclude a file
    pub exclude_globs: Vec<String>,
    /// Files larger than this are skipped
    pub max_file_size: u64,
    /// Extra redaction regexes
    pub secret_patterns: Vec<String>,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            include_globs: Vec::new(),
            exclude_globs: vec![
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/vendor/**".to_string(),
                "**/*.lock".to_string(),
                "**/package-lock.json".to_string(),
            ],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            secret_patterns: Vec::new(),
        }
    }
}

impl EvidenceConfig {
    /// Set include globs
    #[must_use]
    pub fn with_include(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    /// Set exclude globs
    #[must_use]
    pub fn with_exclude(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the size cutoff
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

/// Inference settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// Declarative half of the dual opt-in
    pub enabled: bool,
    /// Backend selection
    pub provider: Provider,
    /// Model identifier
    pub model: String,
    /// Endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Maximum backend calls per run
    pub max_retries: u32,
    /// Per-call timeout
    pub timeout_ms: u64,
    /// Base delay between attempts, doubled each retry
    pub backoff_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: Provider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            max_retries: 3,
            timeout_ms: 30_000,
            backoff_ms: 500,
        }
    }
}

/// Discovery thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Level the inference run targets
    pub target_level: Level,
    /// Candidates below this confidence are dropped after validation
    pub min_confidence: f64,
    /// Minimum quality score a section must reach
    pub min_quality: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            target_level: Level::One,
            min_confidence: 0.5,
            min_quality: 0.6,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RippConfig {
    /// Protocol version
    pub ripp_version: String,
    /// Evidence extraction
    pub evidence: EvidenceConfig,
    /// Inference backend
    pub ai: AiConfig,
    /// Discovery thresholds
    pub discovery: DiscoveryConfig,
}

impl Default for RippConfig {
    fn default() -> Self {
        Self {
            ripp_version: RIPP_VERSION.to_string(),
            evidence: EvidenceConfig::default(),
            ai: AiConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl RippConfig {
    /// Load from `path`, or defaults when the file is absent
    ///
    /// # Errors
    /// Returns error if the file exists but is unreadable, malformed, or out
    /// of range
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate YAML text
    ///
    /// # Errors
    /// Returns error if the text is malformed or out of range
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        // An empty document is treated as all defaults
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns the first out-of-range field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ripp_version != RIPP_VERSION {
            return Err(ConfigError::invalid(
                "ripp_version",
                format!("unsupported version {:?}, expected {RIPP_VERSION}", self.ripp_version),
            ));
        }
        if self.evidence.max_file_size == 0 {
            return Err(ConfigError::invalid("evidence.max_file_size", "must be > 0"));
        }
        if self.ai.max_retries == 0 {
            return Err(ConfigError::invalid("ai.max_retries", "must be >= 1"));
        }
        if self.ai.timeout_ms == 0 {
            return Err(ConfigError::invalid("ai.timeout_ms", "must be > 0"));
        }
        if self.ai.model.trim().is_empty() {
            return Err(ConfigError::invalid("ai.model", "must not be empty"));
        }
        for (field, value) in [
            ("discovery.min_confidence", self.discovery.min_confidence),
            ("discovery.min_quality", self.discovery.min_quality),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("{value} not in [0,1]")));
            }
        }
        Ok(())
    }
}
