use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::advice::{
    validate_base_url, validate_model_name, AdviceLanguage, GeminiClient, LlmClient, LlmError,
    ModelEndpoint, OllamaClient, RetryDispatcher, RetryPolicy, DEFAULT_BASE_DELAY,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OLLAMA_URL, GEMINI_API_KEY_VAR,
};

/// Application-level constants
pub const APP_NAME: &str = "VietRx";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the reference database inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "fda_database.json";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OLLAMA_MODEL: &str = "medgemma:latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Get the application data directory
/// ~/VietRx/ on all platforms, or ./VietRx when no home directory exists
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the reference drug database
pub fn default_database_path() -> PathBuf {
    app_data_dir().join(DEFAULT_DATABASE_FILE)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "vietrx=debug,vietrx_lib=debug"
    } else {
        "vietrx=info,vietrx_lib=info"
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Provider 'gemini' requires {0} to be set")]
    MissingApiKey(&'static str),

    #[error(transparent)]
    Endpoint(#[from] LlmError),
}

/// Remote model service backing both advice roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Ollama,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err("expected 'gemini' or 'ollama'".to_string()),
        }
    }
}

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub ollama_url: String,
    pub database_path: PathBuf,
    pub language: AdviceLanguage,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Read settings from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve settings through `lookup`. Unset and blank variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get(GEMINI_API_KEY_VAR);

        let provider = match get("VIETRX_PROVIDER") {
            Some(raw) => parse_var("VIETRX_PROVIDER", &raw)?,
            None if gemini_api_key.is_some() => Provider::Gemini,
            None => Provider::Ollama,
        };
        if provider == Provider::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::MissingApiKey(GEMINI_API_KEY_VAR));
        }

        let model = get("VIETRX_MODEL").unwrap_or_else(|| provider.default_model().to_string());
        validate_model_name(&model).map_err(|e| invalid("VIETRX_MODEL", &model, e))?;

        let ollama_url = get("VIETRX_OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        if provider == Provider::Ollama {
            validate_base_url(&ollama_url).map_err(|e| invalid("VIETRX_OLLAMA_URL", &ollama_url, e))?;
        }

        let database_path = get("VIETRX_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let language = match get("VIETRX_LANG") {
            Some(raw) => parse_var("VIETRX_LANG", &raw)?,
            None => AdviceLanguage::default(),
        };

        let max_retries = match get("VIETRX_MAX_RETRIES") {
            Some(raw) => {
                let n: u32 = parse_var("VIETRX_MAX_RETRIES", &raw)?;
                if n == 0 {
                    return Err(invalid("VIETRX_MAX_RETRIES", &raw, "must be at least 1"));
                }
                n
            }
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let base_delay = match get("VIETRX_BASE_DELAY_SECS") {
            Some(raw) => {
                let secs: f64 = parse_var("VIETRX_BASE_DELAY_SECS", &raw)?;
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| invalid("VIETRX_BASE_DELAY_SECS", &raw, "must be a non-negative number of seconds"))?
            }
            None => DEFAULT_BASE_DELAY,
        };

        let timeout_secs = match get("VIETRX_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_var("VIETRX_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(invalid("VIETRX_TIMEOUT_SECS", &raw, "must be at least 1"));
                }
                secs
            }
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider,
            gemini_api_key,
            model,
            ollama_url,
            database_path,
            language,
            max_retries,
            base_delay,
            timeout_secs,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_delay)
    }

    /// Construct the HTTP client for the configured provider.
    pub fn build_client(&self) -> Result<Box<dyn LlmClient + Send + Sync>, ConfigError> {
        let client: Box<dyn LlmClient + Send + Sync> = match self.provider {
            Provider::Gemini => {
                let key = self
                    .gemini_api_key
                    .as_deref()
                    .ok_or(ConfigError::MissingApiKey(GEMINI_API_KEY_VAR))?;
                Box::new(GeminiClient::new(key, self.timeout_secs)?)
            }
            Provider::Ollama => Box::new(OllamaClient::new(&self.ollama_url, self.timeout_secs)?),
        };
        Ok(client)
    }

    /// Client, model and retry policy bundled for the advice pipeline.
    pub fn build_endpoint(&self) -> Result<ModelEndpoint, ConfigError> {
        Ok(ModelEndpoint::new(
            self.build_client()?,
            &self.model,
            RetryDispatcher::new(self.retry_policy()),
        ))
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| invalid(var, raw, e))
}

fn invalid(var: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
