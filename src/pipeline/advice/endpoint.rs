//! A model client bound to one model id and routed through the retry dispatcher.
//!
//! Both advice roles share one endpoint so they see the same model and the
//! same retry policy.

use super::retry::RetryDispatcher;
use super::types::{GenerationOptions, GenerationRequest, LlmClient};

pub struct ModelEndpoint {
    client: Box<dyn LlmClient + Send + Sync>,
    model: String,
    dispatcher: RetryDispatcher,
}

impl ModelEndpoint {
    pub fn new(
        client: Box<dyn LlmClient + Send + Sync>,
        model: &str,
        dispatcher: RetryDispatcher,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dispatcher,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &'static str {
        self.client.provider()
    }

    /// Send one prompt, retrying transient failures. `None` when the call
    /// could not be completed.
    pub fn call(&self, role: &str, prompt: &str, options: GenerationOptions) -> Option<String> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            options,
        };
        tracing::debug!(
            role,
            provider = self.client.provider(),
            model = %self.model,
            prompt_len = prompt.len(),
            "Dispatching model call"
        );
        self.dispatcher.dispatch(role, || self.client.generate(&request))
    }
}
