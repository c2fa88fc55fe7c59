//! Deterministic inference backend

use async_trait::async_trait;
use ripp_discovery::{BackendError, InferenceBackend, InferenceRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return this text
    Respond(String),
    /// Fail as unreachable
    Unavailable,
    /// Fail with an empty completion (retryable)
    Empty,
    /// Never answer within any sane timeout
    Hang,
}

/// Backend that replays a script and counts calls
///
/// When the script runs out the last step repeats.
#[derive(Debug)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    requests: Mutex<Vec<InferenceRequest>>,
    calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Always answer `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self::new([ScriptStep::Respond(text.into())])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_step(&self) -> ScriptStep {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = Some(step.clone());
            return step;
        }
        last.clone().unwrap_or(ScriptStep::Empty)
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "fixture"
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match self.next_step() {
            ScriptStep::Respond(text) => Ok(text),
            ScriptStep::Unavailable => Err(BackendError::Unavailable {
                backend: "scripted".into(),
                reason: "script says so".into(),
            }),
            ScriptStep::Empty => Err(BackendError::EmptyResponse),
            ScriptStep::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(BackendError::EmptyResponse)
            }
        }
    }
}
