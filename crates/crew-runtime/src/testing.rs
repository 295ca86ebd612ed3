//! Scripted LLM provider for tests

use async_trait::async_trait;
use crew_llm::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned responses in order and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
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
