use serde::{Deserialize, Serialize};

use super::types::{validate_base_url, GenerationRequest, LlmClient, ResponseFormat};
use super::LlmError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama HTTP client for local inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client for a loopback Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        validate_base_url(base_url)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434 with a 2-minute timeout.
    pub fn default_local() -> Result<Self, LlmError> {
        Self::new(DEFAULT_OLLAMA_URL, 120)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

fn build_request(request: &GenerationRequest) -> OllamaGenerateRequest<'_> {
    OllamaGenerateRequest {
        model: &request.model,
        prompt: &request.prompt,
        stream: false,
        format: match request.options.response_format {
            ResponseFormat::Json => Some("json"),
            ResponseFormat::Text => None,
        },
        options: OllamaOptions {
            temperature: request.options.temperature,
            num_predict: request.options.max_output_tokens,
        },
    }
}

impl LlmClient for OllamaClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = build_request(request);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn provider(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::advice::types::GenerationOptions;

    fn request(options: GenerationOptions) -> GenerationRequest {
        GenerationRequest {
            model: "medgemma:latest".into(),
            prompt: "Describe Advil".into(),
            options,
        }
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn constructor_rejects_remote_host() {
        let result = OllamaClient::new("http://10.0.0.5:11434", 60);
        assert!(matches!(result, Err(LlmError::NonLocalEndpoint)));
    }

    #[test]
    fn default_local_uses_standard_port() {
        let client = OllamaClient::default_local().unwrap();
        assert_eq!(client.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn json_request_sets_format() {
        let req = request(GenerationOptions::json(0.0));
        let body = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
        assert!(body["options"].get("num_predict").is_none());
    }

    #[test]
    fn text_request_omits_format() {
        let mut options = GenerationOptions::text(0.4);
        options.max_output_tokens = Some(256);
        let req = request(options);
        let body = serde_json::to_value(build_request(&req)).unwrap();
        assert!(body.get("format").is_none());
        assert_eq!(body["options"]["num_predict"], 256);
        assert_eq!(body["model"], "medgemma:latest");
    }
}
