//! In-context exchange backend
//!
//! For an assistant that is already in the loop: the prompt is written to
//! `.ripp/discovery/prompt.md` and the answer is read from
//! `.ripp/discovery/response.json`. Without a response file the backend is
//! unavailable and the run stops with instructions.

use crate::backend::{InferenceBackend, InferenceRequest};
use crate::error::BackendError;
use async_trait::async_trait;
use ripp_core::io::write_atomic;
use ripp_core::{StoreError, Workspace};
use std::path::PathBuf;

const PROVIDER: &str = "in-context";

/// Prompt file name inside the discovery directory
pub const PROMPT_FILE: &str = "prompt.md";

/// Response file name inside the discovery directory
pub const RESPONSE_FILE: &str = "response.json";

/// File-exchange backend
#[derive(Debug, Clone)]
pub struct InContextBackend {
    dir: PathBuf,
    model: String,
}

impl InContextBackend {
    /// Exchange files under the workspace discovery directory
    #[must_use]
    pub fn new(workspace: &Workspace, model: impl Into<String>) -> Self {
        Self {
            dir: workspace.discovery_dir(),
            model: model.into(),
        }
    }

    /// Path the prompt is written to
    #[must_use]
    pub fn prompt_path(&self) -> PathBuf {
        self.dir.join(PROMPT_FILE)
    }

    /// Path the response is read from
    #[must_use]
    pub fn response_path(&self) -> PathBuf {
        self.dir.join(RESPONSE_FILE)
    }
}

#[async_trait]
impl InferenceBackend for InContextBackend {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, BackendError> {
        let prompt_path = self.prompt_path();
        let text = format!("{}\n\n{}\n", request.system, request.prompt);
        let target = prompt_path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, text.as_bytes()))
            .await
            .map_err(|e| BackendError::Unavailable {
                backend: PROVIDER.into(),
                reason: format!("prompt writer task failed: {e}"),
            })??;
        tracing::info!(path = %prompt_path.display(), "wrote discovery prompt");

        let response_path = self.response_path();
        match tokio::fs::read_to_string(&response_path).await {
            Ok(text) if text.trim().is_empty() => Err(BackendError::EmptyResponse),
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::Unavailable {
                backend: PROVIDER.into(),
                reason: format!("no response at {}", response_path.display()),
            }),
            Err(source) => Err(BackendError::Store(StoreError::Io {
                path: response_path,
                source,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> InferenceRequest {
        InferenceRequest {
            system: "SYSTEM".into(),
            prompt: "PROMPT".into(),
            attempt: 1,
        }
    }

    #[tokio::test]
    async fn missing_response_writes_prompt_and_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = InContextBackend::new(&Workspace::new(dir.path()), "assistant");
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
        let prompt = std::fs::read_to_string(backend.prompt_path()).unwrap();
        assert!(prompt.contains("SYSTEM"));
        assert!(prompt.contains("PROMPT"));
    }

    #[tokio::test]
    async fn response_file_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let backend = InContextBackend::new(&Workspace::new(dir.path()), "assistant");
        std::fs::create_dir_all(dir.path().join(".ripp/discovery")).unwrap();
        std::fs::write(backend.response_path(), "{\"candidates\": []}").unwrap();
        assert_eq!(backend.complete(&request()).await.unwrap(), "{\"candidates\": []}");
    }
}
