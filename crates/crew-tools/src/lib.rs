//! Tool management and execution framework for crew pipelines
//!
//! Tools are functions agents call through the LLM's tool-use protocol. This
//! crate provides the [`Tool`] trait, a thread-safe [`ToolRegistry`] and the
//! [`WebSearchTool`] the research agent uses.

pub mod registry;
pub mod search;
pub mod tool;

pub use registry::ToolRegistry;
pub use search::{SearchConfig, SearchResult, WebSearchTool};
pub use tool::Tool;
