//! Error types for memory operations

use crew_llm::LLMError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors raised by memory stores
#[derive(Error, Debug)]
pub enum MemoryError {
    /// SQLite failure in long-term memory
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File system failure
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The embedding backend failed
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LLMError),

    /// Unsupported or incomplete embedder settings
    #[error("Invalid embedder configuration: {0}")]
    Config(String),

    /// A stored value could not be read back
    #[error("Stored memory is corrupt: {0}")]
    Corrupt(String),

    /// A lock was poisoned by a panicking thread
    #[error("Memory store lock poisoned")]
    LockPoisoned,
}

impl MemoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<MemoryError> for crew_core::Error {
    fn from(err: MemoryError) -> Self {
        crew_core::Error::Memory(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_core_error() {
        let err: crew_core::Error = MemoryError::Config("provider 'x'".into()).into();
        assert_eq!(err.kind(), crew_core::ErrorKind::Memory);
        assert!(err.to_string().contains("provider 'x'"));
    }
}
