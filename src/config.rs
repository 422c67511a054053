//! Startup configuration.
//!
//! Everything the chat service needs to talk to the model is collected into a
//! [`Settings`] value once, in `main`, and handed to the components that need
//! it. Nothing here is global.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use reqwest::Url;

use crate::constants;
use crate::error::ConfigError;

/// Model and pacing options shared by the `start` and `chat` commands.
#[derive(Args, Debug, Clone)]
pub struct InferenceArgs {
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, help = "API key for the Gemini API.")]
    pub api_key: Option<String>,
    #[arg(long, env = "ZESTOFY_MODEL", default_value = constants::DEFAULT_MODEL, help = "Model identifier.")]
    pub model: String,
    #[arg(long, default_value_t = constants::DEFAULT_TEMPERATURE, help = "Sampling temperature.")]
    pub temperature: f64,
    #[arg(long, default_value_t = constants::DEFAULT_MAX_OUTPUT_TOKENS, help = "Upper bound on reply length in tokens.")]
    pub max_output_tokens: u32,
    #[arg(long, env = "GEMINI_BASE_URL", default_value = constants::GEMINI_BASE_URL, help = "Base URL of the Gemini REST API.")]
    pub base_url: String,
    #[arg(long, default_value_t = constants::DEFAULT_TIMEOUT_SECS, help = "Timeout for one model request, in seconds.")]
    pub timeout_secs: u64,
    #[arg(long, default_value_t = constants::DEFAULT_MAX_RETRIES, help = "Retries after a transient model API failure.")]
    pub max_retries: u32,
    #[arg(long, default_value_t = constants::DEFAULT_STREAM_DELAY_MS, help = "Delay between streamed words, in milliseconds.")]
    pub stream_delay_ms: u64,
}

/// Validated configuration for the model client and the turn loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub stream_delay: Duration,
}

impl Settings {
    /// Settings with all defaults and the given key. Mostly useful in tests.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: constants::DEFAULT_MODEL.to_string(),
            temperature: constants::DEFAULT_TEMPERATURE,
            max_output_tokens: constants::DEFAULT_MAX_OUTPUT_TOKENS,
            base_url: constants::GEMINI_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_backoff: constants::RETRY_BACKOFF,
            stream_delay: Duration::from_millis(constants::DEFAULT_STREAM_DELAY_MS),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(constants::API_KEY_ENV));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl TryFrom<InferenceArgs> for Settings {
    type Error = ConfigError;

    fn try_from(args: InferenceArgs) -> Result<Self, Self::Error> {
        let api_key = args
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(constants::API_KEY_ENV))?;

        let settings = Settings {
            api_key,
            model: args.model,
            temperature: args.temperature,
            max_output_tokens: args.max_output_tokens,
            base_url: args.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(args.timeout_secs),
            max_retries: args.max_retries,
            retry_backoff: constants::RETRY_BACKOFF,
            stream_delay: Duration::from_millis(args.stream_delay_ms),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Options that only matter to the web shell.
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub host: String,
    pub port: u16,
    /// Load templates from this directory and reload them on change.
    pub template_dir: Option<PathBuf>,
    pub static_dir: PathBuf,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            template_dir: None,
            static_dir: PathBuf::from(constants::DEFAULT_STATIC_DIR),
        }
    }
}
