//! Agents, tasks and crew of the market intelligence pipeline

use crate::schemas::{CompetitorAnalysisResult, MarketScanResult, StrategyReport};
use crew_core::{Error, Inputs, Result};
use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
use crew_llm::{EmbeddingProvider, LLMProvider};
use crew_memory::{CrewMemory, EmbedderConfig};
use crew_runtime::{AgentConfig, AgentRuntime, CrewAgent};
use crew_tools::{SearchConfig, Tool, WebSearchTool};
use crew_utils::Settings;
use crew_workflow::{
    Crew, CrewConfig, CrewOutput, OutputSchema, Process, Task, TaskEvaluator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// File name of the long-term memory database inside the memory directory
pub const LONG_TERM_DB: &str = "long_term_memory_storage.db";

const BUNDLED_AGENTS: &str = include_str!("../config/agents.yaml");
const BUNDLED_TASKS: &str = include_str!("../config/tasks.yaml");

/// Agent and task definitions shipped with the binary
pub fn bundled_config() -> Result<CrewConfig> {
    CrewConfig::from_yaml(BUNDLED_AGENTS, BUNDLED_TASKS)
}

/// `agents.yaml`/`tasks.yaml` from `dir` when present there, the bundled
/// definitions otherwise
pub fn load_config(dir: &Path) -> Result<CrewConfig> {
    if dir.join(crew_workflow::config::AGENTS_FILE).exists() {
        CrewConfig::load(dir)
    } else {
        info!(dir = %dir.display(), "No crew configuration found, using bundled definitions");
        bundled_config()
    }
}

/// Factory for the market intelligence crew
///
/// Three standing agents (researcher, competitor analyzer, strategy
/// synthesizer) and a delegating manager run three tasks: scan the market,
/// analyze the competitors, write the strategy report.
pub struct MarketIntelligence {
    config: CrewConfig,
    runtime: AgentRuntime,
    search_tool: Arc<dyn Tool>,
    embedder: Arc<dyn EmbeddingProvider>,
    embedder_config: EmbedderConfig,
    memory_dir: PathBuf,
}

impl MarketIntelligence {
    pub fn builder() -> MarketIntelligenceBuilder {
        MarketIntelligenceBuilder::new()
    }

    /// Wire the OpenAI provider, the Serper search tool and the OpenAI
    /// embedder from `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .openai_api_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("OPENAI_API_KEY is not set".to_string()))?;
        let serper_key = settings
            .serper_api_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("SERPER_API_KEY is not set".to_string()))?;

        let mut openai = OpenAIConfig::new(api_key);
        if let Some(base) = &settings.openai_api_base {
            openai = openai.with_api_base(base);
        }
        let provider = Arc::new(OpenAIProvider::with_config(openai)?);

        let embedder_config = EmbedderConfig::default();
        let embedder = embedder_config.build(Some(api_key), settings.openai_api_base.as_deref())?;

        Self::builder()
            .config(load_config(&settings.config_dir)?)
            .provider(provider)
            .search_tool(Arc::new(WebSearchTool::new(SearchConfig::new(serper_key))?))
            .embedder(embedder, embedder_config)
            .memory_dir(&settings.memory_dir)
            .model(&settings.model)
            .build()
    }

    pub fn config(&self) -> &CrewConfig {
        &self.config
    }

    pub fn memory_dir(&self) -> &Path {
        &self.memory_dir
    }

    fn agent(&self, key: &str, config: AgentConfig, tools: Vec<Arc<dyn Tool>>) -> Result<CrewAgent> {
        self.runtime
            .create_agent(key, config.with_verbose(true), tools)
    }

    /// Market researcher with web search
    pub fn researcher(&self) -> Result<CrewAgent> {
        self.agent(
            "researcher",
            self.config.agent("researcher")?,
            vec![Arc::clone(&self.search_tool)],
        )
    }

    pub fn competitor_analyzer(&self) -> Result<CrewAgent> {
        self.agent(
            "competitor_analyzer",
            self.config.agent("competitor_analyzer")?,
            Vec::new(),
        )
    }

    pub fn strategy_synthesizer(&self) -> Result<CrewAgent> {
        self.agent(
            "strategy_synthesizer",
            self.config.agent("strategy_synthesizer")?,
            Vec::new(),
        )
    }

    /// Manager that coordinates the standing agents; built fresh per crew
    pub fn manager(&self) -> Result<CrewAgent> {
        self.agent(
            "manager",
            self.config.agent("manager")?.with_delegation(true),
            Vec::new(),
        )
    }

    pub fn collect_market_data_task(&self) -> Result<Task> {
        Ok(self
            .task("collect_market_data_task")?
            .with_output_schema(OutputSchema::of::<MarketScanResult>()))
    }

    pub fn analyze_competitors_task(&self) -> Result<Task> {
        Ok(self
            .task("analyze_competitors_task")?
            .with_output_schema(OutputSchema::of::<CompetitorAnalysisResult>()))
    }

    pub fn generate_strategy_report_task(&self) -> Result<Task> {
        Ok(self
            .task("generate_strategy_report_task")?
            .with_output_schema(OutputSchema::of::<StrategyReport>()))
    }

    fn task(&self, key: &str) -> Result<Task> {
        Ok(Task::new(key, self.config.task(key)?))
    }

    /// Long-term memory in `<memory_dir>/long_term_memory_storage.db`,
    /// short-term and entity memory as JSON files next to it
    pub async fn memory(&self) -> Result<CrewMemory> {
        let memory = CrewMemory::open(
            self.memory_dir.join(LONG_TERM_DB),
            &self.memory_dir,
            Arc::clone(&self.embedder),
            &self.embedder_config,
        )
        .await?;
        Ok(memory)
    }

    /// The hierarchical crew with all three memory stores attached
    pub async fn crew(&self) -> Result<Crew> {
        Crew::builder()
            .agents([
                self.researcher()?,
                self.competitor_analyzer()?,
                self.strategy_synthesizer()?,
            ])
            .tasks([
                self.collect_market_data_task()?,
                self.analyze_competitors_task()?,
                self.generate_strategy_report_task()?,
            ])
            .process(Process::Hierarchical)
            .manager_agent(self.manager()?)
            .memory(self.memory().await?)
            .evaluator(TaskEvaluator::new(
                Arc::clone(self.runtime.provider()),
                self.runtime.config().default_model.clone(),
            ))
            .build()
    }

    /// Build a crew and run it once
    pub async fn kickoff(&self, inputs: Inputs) -> Result<CrewOutput> {
        self.crew().await?.kickoff(inputs).await
    }
}

/// Builder for [`MarketIntelligence`]; every backend can be swapped
pub struct MarketIntelligenceBuilder {
    config: Option<CrewConfig>,
    provider: Option<Arc<dyn LLMProvider>>,
    search_tool: Option<Arc<dyn Tool>>,
    embedder: Option<(Arc<dyn EmbeddingProvider>, EmbedderConfig)>,
    memory_dir: PathBuf,
    model: String,
}

impl MarketIntelligenceBuilder {
    pub fn new() -> Self {
        let settings = Settings::default();
        Self {
            config: None,
            provider: None,
            search_tool: None,
            embedder: None,
            memory_dir: settings.memory_dir,
            model: settings.model,
        }
    }

    /// Agent and task definitions; the bundled ones when unset
    pub fn config(mut self, config: CrewConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn search_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.search_tool = Some(tool);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>, config: EmbedderConfig) -> Self {
        self.embedder = Some((embedder, config));
        self
    }

    pub fn memory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.memory_dir = dir.into();
        self
    }

    /// Chat model for agents without their own `llm`
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn build(self) -> Result<MarketIntelligence> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("LLM provider not set".to_string()))?;
        let search_tool = self
            .search_tool
            .ok_or_else(|| Error::InitializationFailed("Search tool not set".to_string()))?;
        let (embedder, embedder_config) = self
            .embedder
            .ok_or_else(|| Error::InitializationFailed("Embedder not set".to_string()))?;
        let config = match self.config {
            Some(config) => config,
            None => bundled_config()?,
        };

        let runtime = AgentRuntime::builder()
            .provider(provider)
            .default_model(self.model)
            .build()?;

        Ok(MarketIntelligence {
            config,
            runtime,
            search_tool,
            embedder,
            embedder_config,
            memory_dir: self.memory_dir,
        })
    }
}

impl Default for MarketIntelligenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
