//! In-crate model clients for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::types::{GenerationRequest, LlmClient};
use super::LlmError;

/// Returns the same response to every request and records what it was sent.
pub struct MockLlmClient {
    response: String,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle on the recorded requests; stays valid after the client is boxed.
    pub fn requests(&self) -> Arc<Mutex<Vec<GenerationRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}

/// Plays back a fixed sequence of results, one per call.
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLlmClient {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Repeat the same failure `times` times.
    pub fn failing(times: usize, make: impl Fn() -> LlmError) -> Self {
        Self::new((0..times).map(|_| Err(make())).collect())
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl LlmClient for ScriptedLlmClient {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ResponseParsing("script exhausted".into())))
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}
