//! Local Ollama backend

use crate::backend::{InferenceBackend, InferenceRequest};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default local endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'static str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// `/api/generate` client
#[derive(Debug)]
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// Create a client; `timeout` bounds each HTTP call
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(
        endpoint: Option<&str>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.unwrap_or(DEFAULT_ENDPOINT).trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            system: &request.system,
            prompt: &request.prompt,
            format: "json",
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                return Err(BackendError::Unavailable {
                    backend: PROVIDER.into(),
                    reason: format!("cannot connect to {}: {e}", self.endpoint),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        if generated.response.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(generated.response)
    }
}
