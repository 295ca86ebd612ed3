//! Error types for the market intelligence application

use crew_core::ErrorKind;
use thiserror::Error;

/// Failures surfaced by the entry points
#[derive(Debug, Error)]
pub enum MarketIntelError {
    /// Anything that went wrong while building or running the crew
    #[error("An error occurred while running the crew: {source}")]
    Run {
        #[source]
        source: crew_core::Error,
    },

    /// Same as [`Run`](Self::Run), for runs started from a trigger payload
    #[error("An error occurred while running the crew with trigger: {source}")]
    RunWithTrigger {
        #[source]
        source: crew_core::Error,
    },

    #[error("No trigger payload provided. Please provide JSON payload as argument.")]
    MissingTriggerPayload,

    #[error("Invalid JSON payload provided as argument")]
    InvalidTriggerPayload(#[source] serde_json::Error),
}

impl MarketIntelError {
    /// Failure class of the wrapped crew error, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Run { source } | Self::RunWithTrigger { source } => Some(source.kind()),
            Self::MissingTriggerPayload | Self::InvalidTriggerPayload(_) => None,
        }
    }
}

/// Result type alias for the entry points
pub type Result<T> = std::result::Result<T, MarketIntelError>;
