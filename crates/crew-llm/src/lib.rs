//! LLM provider abstraction layer for crew pipelines
//!
//! This crate provides provider-agnostic types for talking to language models:
//!
//! - Message types, including tool use and tool results
//! - Completion request/response types with optional JSON response format
//! - Tool definitions for function calling
//! - [`LLMProvider`] for chat completions and [`EmbeddingProvider`] for vectors
//! - An OpenAI implementation of both (feature `openai`, on by default)

pub mod completion;
pub mod embedding;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, ResponseFormat, StopReason, TokenUsage};
pub use embedding::{EmbeddingRequest, EmbeddingResponse};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::{EmbeddingProvider, LLMProvider};
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;
