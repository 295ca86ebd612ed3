//! Test doubles for the LLM and embedding backends

use async_trait::async_trait;
use crew_llm::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
    LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned responses in order and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> crew_llm::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::RequestFailed("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn text(answer: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(answer),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        },
    }
}

pub fn tool_call(id: &str, name: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        message: Message::tool_call(id, name, input),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        },
    }
}

/// Embeds text as word counts over a few hashed dimensions
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> crew_llm::Result<EmbeddingResponse> {
        let embeddings = request
            .input
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; 64];
                for word in text.split_whitespace() {
                    let slot = word.bytes().map(usize::from).sum::<usize>() % vector.len();
                    vector[slot] += 1.0;
                }
                vector
            })
            .collect();
        Ok(EmbeddingResponse {
            embeddings,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}
