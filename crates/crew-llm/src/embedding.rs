//! Embedding request and response types

use crate::TokenUsage;
use serde::{Deserialize, Serialize};

/// Request to embed one or more texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Embedding model identifier
    pub model: String,
    /// Texts to embed, in order
    pub input: Vec<String>,
}

impl EmbeddingRequest {
    /// Embed a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: vec![text.into()],
        }
    }
}

/// Vectors returned for an [`EmbeddingRequest`], one per input, same order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Embedding vectors
    pub embeddings: Vec<Vec<f32>>,
    /// Token usage (output tokens are always zero)
    pub usage: TokenUsage,
}

impl EmbeddingResponse {
    /// Take the first vector, if any
    pub fn into_first(self) -> Option<Vec<f32>> {
        self.embeddings.into_iter().next()
    }
}
