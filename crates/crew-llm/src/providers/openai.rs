//! OpenAI provider implementation
//!
//! Implements [`LLMProvider`] over the chat completions endpoint and
//! [`EmbeddingProvider`] over the embeddings endpoint. Any OpenAI-compatible
//! server works through a custom `api_base`.
//!
//! ```no_run
//! use crew_llm::{CompletionRequest, LLMProvider, Message};
//! use crew_llm::providers::OpenAIProvider;
//!
//! # async fn example() -> crew_llm::Result<()> {
//! let provider = OpenAIProvider::from_env()?;
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .add_message(Message::user("Hello!"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, EmbeddingProvider, EmbeddingRequest,
    EmbeddingResponse, LLMError, LLMProvider, Message, MessageContent, ResponseFormat, Result,
    Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read `OPENAI_API_KEY` and, if set, `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI chat and embedding provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from `OPENAI_API_KEY` / `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    async fn post<B: Serialize>(&self, path: &str, model: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/{path}", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response.text().await?;
        Err(match status.as_u16() {
            401 => LLMError::AuthenticationFailed,
            429 => LLMError::RateLimitExceeded(error_text),
            400 => LLMError::InvalidRequest(error_text),
            404 => LLMError::ModelNotFound(model.to_string()),
            _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            response_format: request.response_format,
        };

        let response = self
            .post("chat/completions", &request.model, &openai_request)
            .await?;

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        debug!(
            finish_reason = %choice.finish_reason,
            prompt_tokens = openai_response.usage.prompt_tokens,
            completion_tokens = openai_response.usage.completion_tokens,
            "OpenAI completion received"
        );

        Ok(CompletionResponse {
            message: parse_openai_response(choice.message)?,
            stop_reason: map_stop_reason(&choice.finish_reason),
            usage: TokenUsage {
                input_tokens: openai_response.usage.prompt_tokens,
                output_tokens: openai_response.usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, inputs = request.input.len()))]
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let response = self.post("embeddings", &request.model, &request).await?;

        let mut parsed: OpenAIEmbeddingResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        if parsed.data.len() != request.input.len() {
            return Err(LLMError::UnexpectedResponse(format!(
                "Expected {} embeddings, got {}",
                request.input.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);

        Ok(EmbeddingResponse {
            embeddings: parsed.data.into_iter().map(|d| d.embedding).collect(),
            usage: TokenUsage {
                input_tokens: parsed.usage.prompt_tokens,
                output_tokens: 0,
            },
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbedding>,
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// System prompt first, then every message converted in order
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);

    if let Some(sys) = system {
        result.push(OpenAIMessage::text("system", sys));
    }

    for msg in messages {
        result.extend(convert_message(msg));
    }

    result
}

/// One of our messages may become several OpenAI messages: tool results are
/// sent as separate `tool` role messages.
fn convert_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    match msg.content {
        Some(MessageContent::Text(text)) => vec![OpenAIMessage::text(role, text)],
        Some(MessageContent::Blocks(blocks)) => convert_blocks(role, blocks),
        None => vec![OpenAIMessage::text(role, String::new())],
    }
}

fn convert_blocks(role: &'static str, blocks: Vec<ContentBlock>) -> Vec<OpenAIMessage> {
    let mut tool_messages = Vec::new();
    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: "function".to_string(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => tool_messages.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let mut messages = Vec::with_capacity(tool_messages.len() + 1);
    if !texts.is_empty() || !tool_calls.is_empty() {
        messages.push(OpenAIMessage {
            role,
            content: (!texts.is_empty()).then(|| texts.join("\n")),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        });
    }
    messages.extend(tool_messages);
    messages
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn parse_openai_response(msg: OpenAIResponseMessage) -> Result<Message> {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let input: serde_json::Value = serde_json::from_str(&call.function.arguments)
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse tool arguments: {e}")))?;

        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Ok(Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "tool_calls" => StopReason::ToolUse,
        "stop" => StopReason::EndTurn,
        other => {
            debug!(finish_reason = other, "Treating finish reason as end of turn");
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(LLMProvider::name(&provider), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_custom_config() {
        let config = OpenAIConfig::new("k")
            .with_api_base("http://localhost:1234/v1")
            .with_timeout(30);
        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.config().api_base, "http://localhost:1234/v1");
        assert_eq!(provider.config().timeout_secs, 30);
    }

    #[test]
    fn test_system_message_first() {
        let messages = build_openai_messages(
            Some("You are the manager".to_string()),
            vec![Message::user("Plan the work")],
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("Plan the work"));
    }

    #[test]
    fn test_tool_call_round_trip_shape() {
        let call = Message::tool_call("call_1", "search_the_internet", json!({"search_query": "AI"}));
        let converted = convert_message(call);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "assistant");
        assert!(converted[0].content.is_none());
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "search_the_internet");
        assert_eq!(calls[0].function.arguments, r#"{"search_query":"AI"}"#);

        let result = Message::tool_result("call_1".to_string(), "[]".to_string());
        let converted = convert_message(result);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "tool");
        assert_eq!(converted[0].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_tool_definition_conversion() {
        let tools = convert_tools(&[ToolDefinition::new(
            "search_the_internet",
            "Search the web",
            json!({"type": "object"}),
        )]);
        assert_eq!(tools[0].tool_type, "function");
        assert_eq!(tools[0].function.name, "search_the_internet");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let msg = OpenAIResponseMessage {
            content: Some("Searching".to_string()),
            tool_calls: Some(vec![OpenAIToolCall {
                id: "call_9".to_string(),
                tool_type: "function".to_string(),
                function: OpenAIFunctionCall {
                    name: "search_the_internet".to_string(),
                    arguments: r#"{"search_query":"AI LLMs"}"#.to_string(),
                },
            }]),
        };

        let message = parse_openai_response(msg).unwrap();
        assert_eq!(message.text().as_deref(), Some("Searching"));
        assert_eq!(message.tool_uses().len(), 1);
    }

    #[test]
    fn test_parse_response_bad_arguments() {
        let msg = OpenAIResponseMessage {
            content: None,
            tool_calls: Some(vec![OpenAIToolCall {
                id: "call_9".to_string(),
                tool_type: "function".to_string(),
                function: OpenAIFunctionCall {
                    name: "x".to_string(),
                    arguments: "not json".to_string(),
                },
            }]),
        };
        assert!(matches!(
            parse_openai_response(msg),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("tool_calls"), StopReason::ToolUse);
        assert_eq!(map_stop_reason("content_filter"), StopReason::EndTurn);
    }

    #[test]
    fn test_embedding_response_parsing() {
        let raw = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ],
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        });
        let mut parsed: OpenAIEmbeddingResponse = serde_json::from_value(raw).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0, 0.0]);
        assert_eq!(parsed.usage.completion_tokens, 0);
    }
}
