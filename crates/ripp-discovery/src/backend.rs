//! Backend capability
//!
//! Every model backend implements [`InferenceBackend`]. The engine owns
//! prompting, timeouts, cancellation and retries; a backend only turns one
//! request into raw completion text.

use crate::error::BackendError;
use async_trait::async_trait;

/// One completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Standing instructions
    pub system: String,
    /// Evidence summary, section requirements and any corrective feedback
    pub prompt: String,
    /// 1-based attempt number
    pub attempt: u32,
}

/// A model that completes discovery prompts
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Provider name recorded in candidate provenance
    fn provider(&self) -> &str;

    /// Model identifier recorded in candidate provenance
    fn model(&self) -> &str;

    /// Complete `request`, returning the raw response text
    ///
    /// Dropping the returned future abandons the call.
    async fn complete(&self, request: &InferenceRequest) -> Result<String, BackendError>;
}
