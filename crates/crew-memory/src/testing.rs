//! Deterministic embedders for tests

use async_trait::async_trait;
use crew_llm::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, LLMError, TokenUsage};

const DIMENSIONS: usize = 256;

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension
pub struct KeywordEmbedder;

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSIONS];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        vector[hash % DIMENSIONS] += 1.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> crew_llm::Result<EmbeddingResponse> {
        Ok(EmbeddingResponse {
            embeddings: request.input.iter().map(|t| keyword_vector(t)).collect(),
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Embedder whose backend is always down
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _request: EmbeddingRequest) -> crew_llm::Result<EmbeddingResponse> {
        Err(LLMError::RequestFailed("connection refused".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
