//! Configuration management utilities

use crate::LogFormat;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default chat model when `MODEL` is unset
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid YAML for the expected shape
    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Parsed configuration violates a rule
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Read and deserialize a YAML file
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Process-wide settings read from the environment
///
/// A `.env` file in the working directory is honoured when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Chat model used by every agent without its own `llm` (`MODEL`)
    pub model: String,
    /// `OPENAI_API_KEY`
    pub openai_api_key: Option<String>,
    /// `OPENAI_API_BASE`, for OpenAI-compatible servers
    pub openai_api_base: Option<String>,
    /// `SERPER_API_KEY`
    pub serper_api_key: Option<String>,
    /// Directory holding `agents.yaml` and `tasks.yaml` (`MARKET_INTEL_CONFIG_DIR`)
    pub config_dir: PathBuf,
    /// Directory for memory stores (`MARKET_INTEL_MEMORY_DIR`)
    pub memory_dir: PathBuf,
    /// `CREW_LOG_FORMAT`
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            openai_api_key: None,
            openai_api_base: None,
            serper_api_key: None,
            config_dir: PathBuf::from("config"),
            memory_dir: PathBuf::from("memory"),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Load `.env` (if any) and read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Err(e) if !e.not_found() => {
                return Err(ConfigError::Invalid(format!("Failed to load .env: {e}")));
            }
            _ => {}
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let log_format = match get("CREW_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(ConfigError::Invalid)?,
            None => defaults.log_format,
        };

        Ok(Self {
            model: get("MODEL").unwrap_or(defaults.model),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_api_base: get("OPENAI_API_BASE"),
            serper_api_key: get("SERPER_API_KEY"),
            config_dir: get("MARKET_INTEL_CONFIG_DIR").map_or(defaults.config_dir, PathBuf::from),
            memory_dir: get("MARKET_INTEL_MEMORY_DIR").map_or(defaults.memory_dir, PathBuf::from),
            log_format,
        })
    }

    /// Set the configuration directory
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Set the memory directory
    pub fn with_memory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.memory_dir = dir.into();
        self
    }

    /// Set the chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
