//! Candidate inference engine
//!
//! Drives one backend through a bounded retry loop:
//!
//! 1. Build the prompt from the evidence pack and target level
//! 2. Call the backend under a per-call timeout, racing cancellation
//! 3. Parse and check the response
//! 4. On failure, append the findings as feedback and try again
//!
//! A timeout counts as a failed attempt. Cancellation is never retried.
//! The engine returns a [`CandidateSet`] and persists nothing.

use crate::backend::{InferenceBackend, InferenceRequest};
use crate::error::{BackendError, DiscoveryError};
use crate::prompt;
use crate::response::{self, ResponseRules};
use ripp_core::{
    AiConfig, CandidateSet, Clock, Diagnose, DiscoveryConfig, EvidencePack, GeneratedBy, Level,
    SystemClock, CANDIDATE_SET_VERSION,
};
use ripp_schema::SchemaValidator;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Longest pause between attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Attempt bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Backend calls per run, including the first
    pub max_attempts: u32,
    /// Bound on each call
    pub timeout: Duration,
    /// Pause before the second attempt; doubles afterwards
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Policy from the `ai` settings
    #[must_use]
    pub fn from_config(ai: &AiConfig) -> Self {
        Self {
            max_attempts: ai.max_retries.max(1),
            timeout: Duration::from_millis(ai.timeout_ms),
            backoff: Duration::from_millis(ai.backoff_ms),
        }
    }

    /// Pause before `attempt` (1-based); zero before the first
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

/// Per-run options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Level whose required sections the run must cover
    pub target_level: Level,
}

/// Evidence-grounded candidate inference
pub struct CandidateInferenceEngine {
    backend: Arc<dyn InferenceBackend>,
    validator: SchemaValidator,
    policy: RetryPolicy,
    min_confidence: f64,
    min_quality: f64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CandidateInferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateInferenceEngine")
            .field("provider", &self.backend.provider())
            .field("model", &self.backend.model())
            .field("policy", &self.policy)
            .field("min_confidence", &self.min_confidence)
            .field("min_quality", &self.min_quality)
            .finish_non_exhaustive()
    }
}

impl CandidateInferenceEngine {
    /// Create an engine over `backend`
    ///
    /// # Errors
    /// Returns error if the embedded schemas fail to compile
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        ai: &AiConfig,
        discovery: &DiscoveryConfig,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            backend,
            validator: SchemaValidator::new()?,
            policy: RetryPolicy::from_config(ai),
            min_confidence: discovery.min_confidence,
            min_quality: discovery.min_quality,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a specific clock for the candidate set timestamp
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Infer a candidate set from `pack`
    ///
    /// # Errors
    /// - [`DiscoveryError::Cancelled`] when `cancel` fires
    /// - [`DiscoveryError::Backend`] when the backend is unusable
    /// - [`DiscoveryError::RetriesExhausted`] when no attempt validates
    pub async fn infer_intent(
        &self,
        pack: &EvidencePack,
        options: InferenceOptions,
        cancel: &CancellationToken,
    ) -> Result<CandidateSet, DiscoveryError> {
        let level = options.target_level;
        let base = prompt::build(pack, level);
        let rules = ResponseRules::new(pack, level, self.min_quality, self.min_confidence);
        tracing::info!(
            provider = self.backend.provider(),
            model = self.backend.model(),
            level = %level,
            max_attempts = self.policy.max_attempts,
            "candidate inference started"
        );

        let mut feedback: Option<String> = None;
        let mut last_failure = String::from("no attempt completed");

        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        return Err(self.cancelled(attempt - 1));
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(self.cancelled(attempt - 1));
            }

            let request = InferenceRequest {
                system: prompt::SYSTEM_PROMPT.to_string(),
                prompt: prompt::with_feedback(&base, feedback.as_deref()),
                attempt,
            };
            tracing::debug!(attempt, prompt_len = request.prompt.len(), "calling backend");

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(self.cancelled(attempt));
                }
                outcome = tokio::time::timeout(self.policy.timeout, self.backend.complete(&request)) => outcome,
            };

            let text = match outcome {
                Err(_) => {
                    last_failure = format!("backend call timed out after {:?}", self.policy.timeout);
                    tracing::warn!(attempt, "{last_failure}");
                    continue;
                }
                Ok(Err(e)) if e.is_retryable() => {
                    last_failure = e.to_string();
                    tracing::warn!(attempt, error = %e, "backend call failed, retrying");
                    continue;
                }
                Ok(Err(e)) => return Err(self.fatal(e)),
                Ok(Ok(text)) => text,
            };

            match response::parse(&self.validator, &text, &rules) {
                Ok(accepted) => {
                    let set = CandidateSet {
                        version: CANDIDATE_SET_VERSION.to_string(),
                        created: self.clock.now(),
                        generated_by: GeneratedBy {
                            provider: self.backend.provider().to_string(),
                            model: self.backend.model().to_string(),
                            evidence_pack_hash: pack.pack_hash,
                            target_level: level,
                            attempts: attempt,
                        },
                        candidates: accepted.candidates,
                    };
                    tracing::info!(
                        attempts = attempt,
                        candidates = set.len(),
                        below_confidence = accepted.below_confidence,
                        "candidate inference finished"
                    );
                    return Ok(set);
                }
                Err(rejection) => {
                    let text = rejection.feedback();
                    tracing::warn!(
                        attempt,
                        findings = rejection.findings.len(),
                        "backend output failed validation"
                    );
                    last_failure = text.clone();
                    feedback = Some(text);
                }
            }
        }

        tracing::warn!(attempts = self.policy.max_attempts, "candidate inference exhausted retries");
        Err(DiscoveryError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            last_failure,
        })
    }

    fn cancelled(&self, attempts: u32) -> DiscoveryError {
        tracing::warn!(provider = self.backend.provider(), attempts, "candidate inference cancelled");
        DiscoveryError::Cancelled { attempts }
    }

    fn fatal(&self, error: BackendError) -> DiscoveryError {
        tracing::warn!(provider = self.backend.provider(), error = %error, "backend unavailable");
        DiscoveryError::Backend(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            timeout: Duration::from_secs(1),
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before(3), Duration::from_millis(200));
        assert_eq!(policy.delay_before(4), Duration::from_millis(400));
        assert_eq!(policy.delay_before(64), MAX_BACKOFF);
    }

    #[test]
    fn zero_retries_still_allows_one_call() {
        let ai = AiConfig {
            max_retries: 0,
            ..AiConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&ai).max_attempts, 1);
    }
}
