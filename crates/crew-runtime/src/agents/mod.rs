//! Configured crew agents
//!
//! - [`AgentConfig`]: one entry of `agents.yaml`
//! - [`CrewAgent`]: an agent built from a config entry, running the executor
//!   loop with its own tools

pub mod config;
pub mod crew_agent;

pub use config::AgentConfig;
pub use crew_agent::CrewAgent;
