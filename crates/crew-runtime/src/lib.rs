//! Agent runtime for crew pipelines
//!
//! This crate provides the runtime infrastructure for executing agents:
//! the [`AgentExecutor`] LLM/tool loop, the [`AgentRuntime`] that owns the
//! shared provider and tools, [`CrewAgent`]s built from [`AgentConfig`]
//! entries, and the delegation tools a manager uses to hand work to
//! coworkers.

pub mod agents;
pub mod delegation;
pub mod executor;
pub mod prompts;
pub mod runtime;

pub use agents::{AgentConfig, CrewAgent};
pub use delegation::{AskQuestionTool, DelegateWorkTool, delegation_tools};
pub use executor::{AgentExecutor, ExecutionOutput, ExecutorConfig};
pub use prompts::interpolate_inputs;
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};

#[cfg(test)]
pub(crate) mod testing;
