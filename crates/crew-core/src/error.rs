//! Error types for crew operations

use thiserror::Error;

/// Result type alias for crew operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure class, for callers that branch on what went wrong
/// instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing configuration, detected before or during construction
    Configuration,
    /// The LLM backend failed or answered with something unusable
    Llm,
    /// A tool (search, delegation, ...) failed
    Tool,
    /// A task result did not match its declared output schema
    Validation,
    /// A memory store could not be opened, read or written
    Memory,
    /// Anything else raised while building or running agents
    Internal,
}

/// Error type for crew operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration is missing a key, references an unknown name, or is malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LLM request or response failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Tool execution failure
    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    /// The service behind a tool could not be reached; ends the run
    #[error("Tool '{tool}' is unavailable: {message}")]
    Unavailable { tool: String, message: String },

    /// Output did not validate against a schema
    #[error("Output failed validation against {schema}: {message}")]
    Validation { schema: String, message: String },

    /// Memory storage failure
    #[error("Memory error: {0}")]
    Memory(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),
}

impl Error {
    /// Shorthand for a tool failure
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a tool whose backend is down
    pub fn unavailable(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a schema validation failure
    pub fn validation(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// The failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Llm(_) => ErrorKind::Llm,
            Self::Tool { .. } | Self::Unavailable { .. } => ErrorKind::Tool,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Memory(_) => ErrorKind::Memory,
            Self::InitializationFailed(_) | Self::ProcessingFailed(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::tool("search_the_internet", "connection refused");
        assert_eq!(
            err.to_string(),
            "Tool 'search_the_internet' failed: connection refused"
        );

        let err = Error::unavailable("search_the_internet", "connection refused");
        assert_eq!(
            err.to_string(),
            "Tool 'search_the_internet' is unavailable: connection refused"
        );

        let err = Error::validation("StrategyReport", "missing field `risks`");
        assert_eq!(
            err.to_string(),
            "Output failed validation against StrategyReport: missing field `risks`"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::Llm("x".into()).kind(), ErrorKind::Llm);
        assert_eq!(Error::tool("t", "x").kind(), ErrorKind::Tool);
        assert_eq!(Error::unavailable("t", "x").kind(), ErrorKind::Tool);
        assert_eq!(Error::validation("s", "x").kind(), ErrorKind::Validation);
        assert_eq!(Error::Memory("x".into()).kind(), ErrorKind::Memory);
        assert_eq!(
            Error::ProcessingFailed("x".into()).kind(),
            ErrorKind::Internal
        );
    }
}
