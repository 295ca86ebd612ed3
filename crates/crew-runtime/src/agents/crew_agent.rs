//! Agent built from a configuration entry

use crate::executor::{AgentExecutor, ExecutionOutput, ExecutorConfig};
use crate::prompts::{SystemPrompt, ToolSummary, render_system_prompt};
use crate::{AgentConfig, RuntimeConfig};
use async_trait::async_trait;
use crew_core::{Agent, Context, Inputs, Result};
use crew_llm::{LLMProvider, ResponseFormat, TokenUsage};
use crew_tools::{Tool, ToolRegistry};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// An agent with a role, a goal, a backstory and its own tools
///
/// Copies made by [`with_extra_tools`](Self::with_extra_tools) and
/// [`with_inputs`](Self::with_inputs) share the token usage counter of the
/// original, so usage is counted once per configured agent.
#[derive(Clone)]
pub struct CrewAgent {
    name: String,
    config: AgentConfig,
    provider: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    defaults: RuntimeConfig,
    usage: Arc<Mutex<TokenUsage>>,
}

impl CrewAgent {
    pub fn new(
        name: impl Into<String>,
        config: AgentConfig,
        provider: Arc<dyn LLMProvider>,
        tools: Arc<ToolRegistry>,
        defaults: RuntimeConfig,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            provider,
            tools,
            defaults,
            usage: Arc::new(Mutex::new(TokenUsage::default())),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn allows_delegation(&self) -> bool {
        self.config.allow_delegation
    }

    /// Tokens used by this agent (and its copies) so far
    pub fn usage(&self) -> TokenUsage {
        *self.usage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of this agent that can also call `extra` tools
    pub fn with_extra_tools(&self, extra: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let registry = ToolRegistry::with_tools(self.tools.list_tools());
        registry.extend(extra);
        Self {
            tools: Arc::new(registry),
            ..self.clone()
        }
    }

    /// Copy with `{name}` placeholders in its texts resolved from `inputs`
    pub fn with_inputs(&self, inputs: &Inputs) -> Result<Self> {
        Ok(Self {
            config: self.config.interpolated(inputs)?,
            ..self.clone()
        })
    }

    /// Rendered system prompt
    pub fn system_prompt(&self) -> Result<String> {
        let tools = self
            .tools
            .list_tools()
            .iter()
            .map(|tool| ToolSummary {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect();

        render_system_prompt(&SystemPrompt {
            role: &self.config.role,
            goal: &self.config.goal,
            backstory: &self.config.backstory,
            tools,
        })
    }

    fn executor_config(&self, response_format: Option<ResponseFormat>) -> Result<ExecutorConfig> {
        Ok(ExecutorConfig {
            max_iterations: self
                .config
                .max_iter
                .unwrap_or(self.defaults.default_max_iterations),
            model: self
                .config
                .model_name()
                .unwrap_or(&self.defaults.default_model)
                .to_string(),
            system_prompt: Some(self.system_prompt()?),
            max_tokens: self.defaults.max_tokens,
            temperature: self.defaults.temperature,
            response_format,
        })
    }

    /// Run the executor loop on a task prompt
    pub async fn execute_task(
        &self,
        prompt: String,
        response_format: Option<ResponseFormat>,
    ) -> Result<ExecutionOutput> {
        if self.config.verbose {
            info!(agent = %self.config.role, prompt = %prompt, "Agent started task");
        } else {
            debug!(agent = %self.config.role, "Agent started task");
        }

        let executor = AgentExecutor::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            self.executor_config(response_format)?,
        );

        let output = executor.run(prompt).await?;
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(output.usage);

        if self.config.verbose {
            info!(agent = %self.config.role, answer = %output.text, "Agent finished task");
        }
        Ok(output)
    }
}

#[async_trait]
impl Agent for CrewAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        debug!(
            agent = %self.name,
            task = context.current_task().unwrap_or("-"),
            "Processing request"
        );
        Ok(self.execute_task(input, None).await?.text)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> &str {
        &self.config.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, text};
    use serde_json::{Value, json};

    struct Noop;

    #[async_trait]
    impl Tool for Noop {
        async fn execute(&self, _params: Value) -> Result<Value> {
            Ok(json!("ok"))
        }
        fn name(&self) -> &str {
            "noop"
        }
        fn description(&self) -> &str {
            "Does nothing"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, config: AgentConfig) -> CrewAgent {
        CrewAgent::new(
            "researcher",
            config,
            provider,
            Arc::new(ToolRegistry::new()),
            RuntimeConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_process_uses_config() {
        let provider = Arc::new(ScriptedProvider::new([text("answer")]));
        let config = AgentConfig::new("Market Researcher", "Find companies", "Analyst")
            .with_llm("openai/gpt-4o")
            .with_max_iter(2);
        let agent = agent(Arc::clone(&provider), config);

        let mut context = Context::new();
        let answer = agent.process("Scan".to_string(), &mut context).await.unwrap();
        assert_eq!(answer, "answer");
        assert_eq!(agent.role(), "Market Researcher");
        assert_eq!(Agent::name(&agent), "researcher");

        let request = provider.request(0);
        assert_eq!(request.model, "gpt-4o");
        assert!(request.tools.is_none());
        assert!(
            request
                .system
                .unwrap()
                .starts_with("You are Market Researcher. Analyst")
        );
        assert_eq!(agent.usage().total(), 15);
    }

    #[tokio::test]
    async fn test_copies_share_usage() {
        let provider = Arc::new(ScriptedProvider::new([text("a"), text("b")]));
        let agent = agent(
            Arc::clone(&provider),
            AgentConfig::new("Manager of {topic}", "g", "b"),
        );

        let with_tool = agent.with_extra_tools([Arc::new(Noop) as Arc<dyn Tool>]);
        assert_eq!(with_tool.tools().len(), 1);
        assert!(agent.tools().is_empty());

        let resolved = with_tool
            .with_inputs(&Inputs::new().with("topic", "AI"))
            .unwrap();
        assert_eq!(resolved.config().role, "Manager of AI");

        resolved.execute_task("x".into(), Some(ResponseFormat::JsonObject)).await.unwrap();
        agent.execute_task("y".into(), None).await.unwrap();
        assert_eq!(agent.usage().total(), 30);

        let first = provider.request(0);
        assert_eq!(first.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(first.tools.unwrap()[0].name, "noop");
        assert!(first.system.unwrap().contains("- noop: Does nothing"));
    }
}
