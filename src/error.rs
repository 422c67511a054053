use thiserror::Error;

/// Problems with the startup configuration. All of them are fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing API key: set {0} in the environment or in .env, or pass --api-key")]
    MissingApiKey(&'static str),
    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f64),
    #[error("model identifier must not be empty")]
    EmptyModel,
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A failed call to the hosted model.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("request to the model API failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request to the model API timed out")]
    Timeout,
    #[error("model API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("prompt was blocked by the model API: {0}")]
    Blocked(String),
    #[error("model API returned no text in the response candidates")]
    EmptyResponse,
    #[error("failed to decode model API response: {0}")]
    Decode(String),
}

impl InferenceError {
    /// Whether sending the same request again might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Transport(err) => err.is_connect() || err.is_request(),
            InferenceError::Timeout => true,
            InferenceError::Status { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            InferenceError::Blocked(_) | InferenceError::EmptyResponse | InferenceError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout
        } else if err.is_decode() {
            InferenceError::Decode(err.to_string())
        } else {
            InferenceError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let rate_limited = InferenceError::Status { status: 429, message: "quota".into() };
        let unavailable = InferenceError::Status { status: 503, message: "busy".into() };
        let unauthorized = InferenceError::Status { status: 401, message: "bad key".into() };

        assert!(rate_limited.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!unauthorized.is_retryable());
    }

    #[test]
    fn test_non_transport_errors_are_final() {
        assert!(InferenceError::Timeout.is_retryable());
        assert!(!InferenceError::EmptyResponse.is_retryable());
        assert!(!InferenceError::Blocked("SAFETY".into()).is_retryable());
        assert!(!InferenceError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn test_missing_api_key_message_names_variable() {
        let err = ConfigError::MissingApiKey("GOOGLE_API_KEY");
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }
}
