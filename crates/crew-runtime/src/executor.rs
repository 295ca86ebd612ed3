//! Agent executor for running agent loops
//!
//! The AgentExecutor implements the core agent loop:
//! 1. Call the LLM with the conversation and the available tools
//! 2. If the answer requests tools, execute them, append the results and loop
//! 3. Otherwise return the answer text
//!
//! When the iteration budget runs out the executor asks once more, with
//! tools withheld, for a final answer.

use crate::prompts::FORCE_FINAL_ANSWER;
use crew_core::{Error, Result};
use crew_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMProvider, Message, ResponseFormat,
    StopReason, TokenUsage,
};
use crew_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of tool-using iterations before forcing an answer
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,

    /// Requested answer format
    pub response_format: Option<ResponseFormat>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: None,
            response_format: None,
        }
    }
}

/// Final answer of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// Answer text
    pub text: String,
    /// Tokens used across every LLM call of the run
    pub usage: TokenUsage,
    /// LLM calls made, including a forced final one
    pub iterations: usize,
    /// Whether the answer had to be forced after the iteration budget ran out
    pub forced: bool,
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the agent loop for one user message
    pub async fn run(&self, user_message: String) -> Result<ExecutionOutput> {
        let mut conversation = vec![Message::user(user_message)];

        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                "Agent iteration started"
            );

            let response = self.complete(&conversation, true).await?;
            usage.add(response.usage);
            conversation.push(response.message.clone());

            if response.message.has_tool_uses() {
                let results = self.execute_tools(&response.message).await?;
                info!(
                    result_count = results.len(),
                    "Tool execution completed, continuing agent loop"
                );
                conversation.extend(results);
                continue;
            }

            let text = final_text(&response)?;
            info!(
                iteration,
                response_length = text.len(),
                "Agent completed naturally"
            );
            return Ok(ExecutionOutput {
                text,
                usage,
                iterations: iteration,
                forced: false,
            });
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached, forcing final answer"
        );
        conversation.push(Message::user(FORCE_FINAL_ANSWER));

        let response = self.complete(&conversation, false).await?;
        usage.add(response.usage);

        Ok(ExecutionOutput {
            text: final_text(&response)?,
            usage,
            iterations: self.config.max_iterations + 1,
            forced: true,
        })
    }

    async fn complete(
        &self,
        conversation: &[Message],
        with_tools: bool,
    ) -> Result<CompletionResponse> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .max_tokens(self.config.max_tokens);

        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(format) = &self.config.response_format {
            builder = builder.response_format(format.clone());
        }
        if with_tools {
            builder = builder.tools(self.tool_registry.definitions());
        }

        let response = self.provider.complete(builder.build()).await?;

        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );

        if let Some(text) = response.message.text() {
            let preview: String = text.chars().take(300).collect();
            debug!(response_preview = %preview, "LLM response content preview");
        }

        Ok(response)
    }

    /// Run every tool call in the message
    ///
    /// Tool failures become error results for the LLM to react to, except
    /// [`Error::Unavailable`], which ends the run.
    async fn execute_tools(&self, message: &Message) -> Result<Vec<Message>> {
        let mut results = Vec::new();

        for tool_use in message.tool_uses() {
            let ContentBlock::ToolUse { id, name, input } = tool_use else {
                continue;
            };

            let input_preview: String = input.to_string().chars().take(500).collect();
            info!(
                tool_name = %name,
                tool_id = %id,
                input_preview = %input_preview,
                "Executing tool"
            );

            let Some(tool) = self.tool_registry.get(name) else {
                warn!(tool_name = %name, "LLM requested an unknown tool");
                results.push(Message::tool_error(
                    id.clone(),
                    format!(
                        "Error: tool '{name}' does not exist. Available tools: {}",
                        self.tool_registry.names().join(", ")
                    ),
                ));
                continue;
            };

            let start_time = Instant::now();
            match tool.execute(input.clone()).await {
                Ok(result) => {
                    let result_str = match &result {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    info!(
                        tool_name = %name,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        result_length = result_str.len(),
                        "Tool execution succeeded"
                    );
                    results.push(Message::tool_result(id.clone(), result_str));
                }
                Err(e @ Error::Unavailable { .. }) => {
                    error!(
                        tool_name = %name,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        error = %e,
                        "Tool backend unavailable, aborting"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        tool_name = %name,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        error = %e,
                        "Tool execution failed"
                    );
                    results.push(Message::tool_error(id.clone(), format!("Error: {e}")));
                }
            }
        }

        Ok(results)
    }
}

fn final_text(response: &CompletionResponse) -> Result<String> {
    if response.stop_reason == StopReason::MaxTokens {
        warn!("Hit max tokens in LLM response");
    }
    response
        .message
        .text()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Llm("LLM returned an empty answer".to_string()))
}
