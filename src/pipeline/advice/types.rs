use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::LlmError;

/// Shape of the text the model must return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    Json,
}

impl ResponseFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

/// Sampling and output controls for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub response_format: ResponseFormat,
    /// `None` leaves the provider default in place.
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn text(temperature: f32) -> Self {
        Self {
            temperature,
            response_format: ResponseFormat::Text,
            max_output_tokens: None,
        }
    }

    pub fn json(temperature: f32) -> Self {
        Self {
            temperature,
            response_format: ResponseFormat::Json,
            max_output_tokens: None,
        }
    }
}

/// One request to the remote model service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Remote model service abstraction (allows mocking).
pub trait LlmClient {
    /// Run one non-streaming generation and return the raw response text.
    fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;

    /// Short provider name for logs.
    fn provider(&self) -> &'static str;
}

/// Validate that a base URL points to localhost only.
///
/// Accepts: localhost, 127.0.0.1, [::1]. Rejects any other host and
/// malformed URLs.
pub fn validate_base_url(url: &str) -> Result<(), LlmError> {
    let after_scheme = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or(LlmError::InvalidUrl)?;

    let host = if after_scheme.starts_with('[') {
        after_scheme
            .split(']')
            .next()
            .unwrap_or("")
            .trim_start_matches('[')
    } else {
        after_scheme
            .split(':')
            .next()
            .unwrap_or("")
            .split('/')
            .next()
            .unwrap_or("")
    };

    match host {
        "localhost" | "127.0.0.1" | "::1" => Ok(()),
        "" => Err(LlmError::InvalidUrl),
        _ => Err(LlmError::NonLocalEndpoint),
    }
}

static MODEL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)?(:[a-zA-Z0-9._-]+)?$")
        .expect("valid regex")
});

/// Validate a model id before it is placed in a request path or body.
///
/// Format: `[namespace/]model[:tag]`, each segment starting alphanumeric.
/// Blocks path traversal and shell metacharacters.
pub fn validate_model_name(name: &str) -> Result<(), LlmError> {
    if MODEL_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(LlmError::InvalidModelName(name.to_string()))
    }
}
