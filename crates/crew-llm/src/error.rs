//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while talking to an LLM or embedding backend
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP transport error (connection refused, timeout, ...)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<LLMError> for crew_core::Error {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ConfigurationError(msg) => crew_core::Error::Configuration(msg),
            other => crew_core::Error::Llm(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;

    #[test]
    fn test_conversion_keeps_kind() {
        let err: crew_core::Error = LLMError::RequestFailed("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::Llm);
        assert!(err.to_string().contains("boom"));

        let err: crew_core::Error =
            LLMError::ConfigurationError("OPENAI_API_KEY not set".into()).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
