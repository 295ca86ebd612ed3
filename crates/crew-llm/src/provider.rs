//! Provider traits

use crate::{CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, Result};
use async_trait::async_trait;

/// Trait for chat-completion providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for the request's conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g. "openai")
    fn name(&self) -> &str;
}

/// Trait for embedding providers used by the memory stores
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every input text
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Provider name (e.g. "openai")
    fn name(&self) -> &str;
}
