//! Backend adapters
//!
//! Selected by `ai.provider`; each adapter is independent and the engine
//! only sees [`InferenceBackend`].

pub mod in_context;
pub mod ollama;
pub mod openai;

pub use in_context::InContextBackend;
pub use ollama::OllamaBackend;
pub use openai::{ApiKey, OpenAiBackend};

use crate::backend::InferenceBackend;
use crate::error::BackendError;
use ripp_core::{AiConfig, Provider, Workspace};
use std::sync::Arc;
use std::time::Duration;

/// Build the backend named by `ai.provider`
///
/// # Errors
/// Returns error if the backend cannot be set up (for example, a missing API key)
pub fn from_config(
    ai: &AiConfig,
    workspace: &Workspace,
) -> Result<Arc<dyn InferenceBackend>, BackendError> {
    let timeout = Duration::from_millis(ai.timeout_ms);
    let endpoint = ai.endpoint.as_deref();
    let backend: Arc<dyn InferenceBackend> = match ai.provider {
        Provider::OpenAi => Arc::new(OpenAiBackend::from_env(endpoint, ai.model.clone(), timeout)?),
        Provider::Ollama => Arc::new(OllamaBackend::new(endpoint, ai.model.clone(), timeout)?),
        Provider::InContext => Arc::new(InContextBackend::new(workspace, ai.model.clone())),
    };
    tracing::debug!(provider = ai.provider.as_str(), model = %ai.model, "selected backend");
    Ok(backend)
}
