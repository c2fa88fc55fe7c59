//! Inferred, unconfirmed intent candidates
//!
//! Two fields are constants: `source` is always `inferred` and
//! `requires_human_confirmation` is always `true`. Both are encoded in types
//! that cannot hold any other value.

use crate::hash::{ContentHash, HashError};
use crate::level::{Level, SectionName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Candidate set format version
pub const CANDIDATE_SET_VERSION: &str = "1.0";

/// Confidence score, always within `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Clamp any value into range; NaN becomes zero
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Strict constructor
    ///
    /// # Errors
    /// Returns error if `value` is outside `[0, 1]` or NaN
    pub fn new(value: f64) -> Result<Self, ConfidenceError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfidenceError(value))
        }
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Out-of-range confidence
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("confidence out of range [0,1]: {0}")]
pub struct ConfidenceError(pub f64);

/// Candidate origin (single-valued)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Produced by inference
    #[default]
    Inferred,
}

/// Marker that serializes as `true` and refuses to deserialize anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfirmationRequired;

impl Serialize for ConfirmationRequired {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for ConfirmationRequired {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if bool::deserialize(deserializer)? {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(
                "requires_human_confirmation must be true",
            ))
        }
    }
}

/// Pointer into the evidence that grounds a candidate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Workspace-relative file path
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// Redacted excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Display for EvidenceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One inferred section of intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Target section
    pub section: SectionName,
    /// Always `inferred`
    #[serde(default)]
    pub source: CandidateSource,
    /// Backend-reported confidence
    pub confidence: Confidence,
    /// Grounding references (never empty for a valid candidate)
    pub evidence: Vec<EvidenceRef>,
    /// Always `true`
    pub requires_human_confirmation: ConfirmationRequired,
    /// Section payload
    pub content: Value,
}

impl Candidate {
    /// Create a candidate; confidence is clamped
    #[must_use]
    pub fn new(
        section: SectionName,
        confidence: f64,
        evidence: Vec<EvidenceRef>,
        content: Value,
    ) -> Self {
        Self {
            section,
            source: CandidateSource::Inferred,
            confidence: Confidence::clamped(confidence),
            evidence,
            requires_human_confirmation: ConfirmationRequired,
            content,
        }
    }
}

/// Who produced a candidate set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBy {
    /// Backend provider name
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Hash of the evidence pack used as input
    pub evidence_pack_hash: ContentHash,
    /// Level the run targeted
    pub target_level: Level,
    /// Backend calls made, including the successful one
    pub attempts: u32,
}

/// Output of one inference run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Format version
    pub version: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Provenance
    pub generated_by: GeneratedBy,
    /// Candidates in backend order
    pub candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Hash over provenance and candidates, excluding the creation time
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn content_hash(&self) -> Result<ContentHash, HashError> {
        ContentHash::compute_serializable(&(&self.generated_by, &self.candidates))
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn out_of_range_confidence_is_rejected_on_load() {
        let err = Confidence::new(1.4).unwrap_err();
        assert!(err.to_string().contains("confidence out of range [0,1]"));

        let yaml = "section: purpose\nconfidence: 1.4\nevidence: []\nrequires_human_confirmation: true\ncontent: {}\n";
        let err = serde_yaml::from_str::<Candidate>(yaml).unwrap_err();
        assert!(err.to_string().contains("confidence out of range [0,1]"));
    }

    #[test]
    fn confirmation_flag_cannot_be_cleared() {
        let yaml = "section: purpose\nconfidence: 0.4\nevidence: []\nrequires_human_confirmation: false\ncontent: {}\n";
        assert!(serde_yaml::from_str::<Candidate>(yaml).is_err());

        let candidate = Candidate::new(SectionName::Purpose, 0.5, vec![], json!({}));
        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["requires_human_confirmation"], json!(true));
        assert_eq!(value["source"], json!("inferred"));
    }

    #[test]
    fn content_hash_ignores_created() {
        let set = |created| CandidateSet {
            version: CANDIDATE_SET_VERSION.into(),
            created,
            generated_by: GeneratedBy {
                provider: "stub".into(),
                model: "m".into(),
                evidence_pack_hash: ContentHash::compute(b"pack"),
                target_level: Level::One,
                attempts: 1,
            },
            candidates: vec![Candidate::new(SectionName::Purpose, 0.9, vec![], json!({}))],
        };
        let a = set(DateTime::<Utc>::default());
        let b = set(Utc::now());
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    proptest! {
        #[test]
        fn clamped_is_always_in_range(v in proptest::num::f64::ANY) {
            let c = Confidence::clamped(v).value();
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }
}
