//! Runtime holding the resources shared by every agent of a crew
//!
//! The AgentRuntime owns the LLM provider, the shared tool registry and the
//! defaults applied to agents whose configuration leaves them open, and
//! creates [`CrewAgent`]s from configuration entries.

use crate::{AgentConfig, CrewAgent};
use crew_core::{Error, Result};
use crew_llm::LLMProvider;
use crew_tools::{Tool, ToolRegistry};
use std::sync::Arc;
use tracing::debug;

/// Configuration for the agent runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Iteration budget for agents without `max_iter`
    pub default_max_iterations: usize,

    /// Model for agents without `llm`
    pub default_model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature; provider default when unset
    pub temperature: Option<f32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_max_iterations: 20,
            default_model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Runtime for creating agents over shared resources
///
/// # Example
///
/// ```no_run
/// use crew_llm::providers::OpenAIProvider;
/// use crew_runtime::{AgentConfig, AgentRuntime};
/// use std::sync::Arc;
///
/// # fn example() -> crew_core::Result<()> {
/// let runtime = AgentRuntime::builder()
///     .provider(Arc::new(OpenAIProvider::from_env()?))
///     .default_model("gpt-4o-mini")
///     .build()?;
///
/// let researcher = runtime.create_agent(
///     "researcher",
///     AgentConfig::new("Market Researcher", "Find trending companies", "Analyst"),
///     Vec::new(),
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Tools every agent receives
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Validate `config` and create an agent with the shared tools plus
    /// `extra_tools`
    pub fn create_agent(
        &self,
        name: impl Into<String>,
        config: AgentConfig,
        extra_tools: Vec<Arc<dyn Tool>>,
    ) -> Result<CrewAgent> {
        let name = name.into();
        config.validate(&name)?;

        let registry = ToolRegistry::with_tools(self.tool_registry.list_tools());
        registry.extend(extra_tools);
        debug!(agent = %name, tools = ?registry.names(), "Creating agent");

        Ok(CrewAgent::new(
            name,
            config,
            Arc::clone(&self.provider),
            Arc::new(registry),
            self.config.clone(),
        ))
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the shared tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default max iterations
    pub fn default_max_iterations(mut self, max: usize) -> Self {
        self.config.default_max_iterations = max;
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not set
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        let tool_registry = self
            .tool_registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::new()));

        Ok(AgentRuntime::new(provider, tool_registry, self.config))
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
