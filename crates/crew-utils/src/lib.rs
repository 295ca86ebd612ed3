//! Shared utilities for crew pipelines
//!
//! Logging setup, environment-driven [`Settings`] and a YAML loading helper
//! used by the configuration layer.

pub mod config;
pub mod logging;

pub use config::{ConfigError, Settings, load_yaml};
pub use logging::{LogFormat, init_tracing};
