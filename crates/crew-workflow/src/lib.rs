//! Crew orchestration for crew pipelines
//!
//! This crate turns configured agents and tasks into a runnable [`Crew`]:
//! tasks are ordered by an explicit [`TaskGraph`], executed sequentially or
//! under a delegating manager ([`Process`]), validated against their
//! [`OutputSchema`], and remembered through the attached memory stores.

pub mod config;
pub mod crew;
pub mod evaluator;
pub mod graph;
pub mod process;
pub mod schema;
pub mod task;

// Re-export for convenience
pub use config::CrewConfig;
pub use crew::{Crew, CrewBuilder, CrewOutput, TaskOutput};
pub use evaluator::{TaskEvaluation, TaskEvaluator};
pub use graph::TaskGraph;
pub use process::Process;
pub use schema::OutputSchema;
pub use task::{Task, TaskConfig};

#[cfg(test)]
pub(crate) mod testing;
