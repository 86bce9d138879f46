pub mod types;
pub mod retry;
pub mod endpoint;
pub mod ollama;
pub mod gemini;
pub mod prompt;
pub mod generator;
pub mod auditor;
pub mod orchestrator;
pub mod speech;
#[cfg(test)]
pub mod mock;

pub use types::*;
pub use retry::*;
pub use endpoint::*;
pub use ollama::*;
pub use gemini::*;
pub use prompt::*;
pub use generator::*;
pub use auditor::*;
pub use orchestrator::*;
pub use speech::*;

use thiserror::Error;

/// Transport-level failure of the remote model service.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Model service is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Model service returned an error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("API key is missing, set {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid model name: '{0}'")]
    InvalidModelName(String),

    #[error("Only localhost connections are allowed for a local model server")]
    NonLocalEndpoint,

    #[error("Invalid URL format")]
    InvalidUrl,
}

/// Whether a failed call is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service is overloaded or temporarily unavailable.
    Transient,
    /// Anything else. Retrying will not help.
    Permanent,
}

impl LlmError {
    /// Classify this failure for the retry dispatcher.
    ///
    /// HTTP 503 is transient on its own. Otherwise the decision falls back to
    /// the textual heuristic in `is_overload_signal`.
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::Api { status: 503, .. } => FailureKind::Transient,
            LlmError::Api { body, .. } if is_overload_signal(body) => FailureKind::Transient,
            LlmError::HttpClient(msg) if is_overload_signal(msg) => FailureKind::Transient,
            _ => FailureKind::Permanent,
        }
    }
}

/// Heuristic: does a service error description signal overload?
///
/// Matches "UNAVAILABLE" and "overloaded" in any case. Other transient
/// phrasings a provider may use are not recognised.
pub fn is_overload_signal(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("unavailable") || lower.contains("overloaded")
}
