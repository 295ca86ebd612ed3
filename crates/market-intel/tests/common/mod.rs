//! Stub backends for end-to-end crew runs

#![allow(dead_code)]

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
    LLMError, LLMProvider, Message, StopReason, TokenUsage,
};
use crew_memory::EmbedderConfig;
use crew_tools::Tool;
use market_intel::MarketIntelligence;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Replays canned responses in order and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Text of the first (task prompt) message of request `index`
    pub fn prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].messages[0]
            .text()
            .unwrap_or_default()
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

/// LLM backend that cannot be reached
pub struct UnreachableProvider;

#[async_trait]
impl LLMProvider for UnreachableProvider {
    async fn complete(&self, _request: CompletionRequest) -> crew_llm::Result<CompletionResponse> {
        Err(LLMError::RequestFailed(
            "connection refused (os error 111)".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unreachable"
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

/// Word-count embedder over a small hashed space
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> crew_llm::Result<EmbeddingResponse> {
        let embeddings = request
            .input
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; 128];
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

/// Search backend that always finds the same two companies
#[derive(Default)]
pub struct StubSearch {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Tool for StubSearch {
    async fn execute(&self, params: Value) -> Result<Value> {
        let query = params["search_query"].as_str().unwrap_or_default().to_string();
        self.queries.lock().unwrap().push(query.clone());
        Ok(json!({
            "query": query,
            "results": [
                {"title": "NVIDIA unveils new AI chips", "link": "https://example.com/nvda", "snippet": "NVDA shares rally", "position": 1},
                {"title": "OpenAI ships a new model", "link": "https://example.com/openai", "snippet": "OpenAI raises funding", "position": 2}
            ]
        }))
    }

    fn name(&self) -> &str {
        "search_the_internet"
    }

    fn description(&self) -> &str {
        "Search the internet"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"search_query": {"type": "string"}}})
    }
}

/// Search backend whose API cannot be reached
pub struct DownSearch;

#[async_trait]
impl Tool for DownSearch {
    async fn execute(&self, _params: Value) -> Result<Value> {
        Err(crew_core::Error::unavailable(
            "search_the_internet",
            "Search request failed: connection refused (os error 111)",
        ))
    }

    fn name(&self) -> &str {
        "search_the_internet"
    }

    fn description(&self) -> &str {
        "Search the internet"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"search_query": {"type": "string"}}})
    }
}

pub fn app(
    provider: Arc<dyn LLMProvider>,
    search: Arc<dyn Tool>,
    memory_dir: &Path,
) -> MarketIntelligence {
    MarketIntelligence::builder()
        .provider(provider)
        .search_tool(search)
        .embedder(Arc::new(StubEmbedder), EmbedderConfig::default())
        .memory_dir(memory_dir)
        .build()
        .unwrap()
}

pub const SCAN: &str = r#"{"companies": [
    {"name": "NVIDIA", "ticker": "NVDA", "reason": "New AI chips"},
    {"name": "OpenAI", "ticker": "PRIVATE", "reason": "New model and funding"}
]}"#;

pub const ANALYSIS: &str = r#"{"research_list": [
    {"name": "NVIDIA", "market_position": "Dominant GPU supplier", "future_outlook": "Strong data center demand", "investment_potential": "High but richly valued"},
    {"name": "OpenAI", "market_position": "Leading model lab", "future_outlook": "Expanding enterprise sales", "investment_potential": "Private, indirect exposure only"}
]}"#;

pub const REPORT: &str = r#"```json
{
    "summary": "AI LLM spending keeps accelerating.",
    "trends": "Custom silicon and enterprise adoption.",
    "opportunities": "Inference infrastructure.",
    "risks": "Valuations and regulation.",
    "recommendations": "Overweight compute suppliers."
}
```"#;

pub const EVALUATION: &str = r#"{
    "suggestions": ["Include market share figures"],
    "quality": 8,
    "entities": [
        {"name": "NVIDIA", "type": "company", "description": "GPU maker", "relationships": "supplies OpenAI"}
    ]
}"#;

/// One full hierarchical run: the manager delegates the scan to the
/// researcher, who searches once, then answers the other two tasks itself
pub fn full_run_script() -> Vec<CompletionResponse> {
    vec![
        tool_call(
            "call_delegate",
            "delegate_work_to_coworker",
            json!({
                "task": "Find the trending AI LLMs companies with tickers",
                "context": "We need name, ticker and reason for each company",
                "coworker": "AI LLMs Market Researcher"
            }),
        ),
        tool_call(
            "call_search",
            "search_the_internet",
            json!({"search_query": "trending AI LLMs companies"}),
        ),
        text("NVIDIA (NVDA) for new AI chips; OpenAI (PRIVATE) for a new model"),
        text(SCAN),
        text(EVALUATION),
        text(ANALYSIS),
        text(EVALUATION),
        text(REPORT),
        text(EVALUATION),
    ]
}
