//! Agent configuration entries

use crate::prompts::interpolate_inputs;
use crew_core::{Error, Inputs, Result};
use serde::{Deserialize, Serialize};

/// One agent definition, as written in `agents.yaml`
///
/// ```
/// use crew_runtime::AgentConfig;
///
/// let config: AgentConfig = serde_yaml::from_str(
///     "role: Market Researcher\ngoal: Find trending companies\nbackstory: Analyst\n",
/// ).unwrap();
/// assert!(!config.allow_delegation);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Role, also the name coworkers use to address this agent
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Model override, e.g. `gpt-4o` or `openai/gpt-4o`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<String>,
    /// Iteration budget before a final answer is forced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iter: Option<usize>,
    /// Whether the agent gets delegation tools over its coworkers
    #[serde(default)]
    pub allow_delegation: bool,
    /// Log prompts and answers at info level
    #[serde(default)]
    pub verbose: bool,
}

impl AgentConfig {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            llm: None,
            max_iter: None,
            allow_delegation: false,
            verbose: false,
        }
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_llm(mut self, llm: impl Into<String>) -> Self {
        self.llm = Some(llm.into());
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    /// Reject blank text fields and a zero iteration budget
    pub fn validate(&self, name: &str) -> Result<()> {
        for (field, value) in [
            ("role", &self.role),
            ("goal", &self.goal),
            ("backstory", &self.backstory),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "Agent '{name}' has an empty '{field}'"
                )));
            }
        }
        if self.max_iter == Some(0) {
            return Err(Error::Configuration(format!(
                "Agent '{name}' must allow at least one iteration"
            )));
        }
        Ok(())
    }

    /// Model name without an `openai/` routing prefix
    pub fn model_name(&self) -> Option<&str> {
        self.llm
            .as_deref()
            .map(|llm| llm.strip_prefix("openai/").unwrap_or(llm))
    }

    /// Copy with `{name}` placeholders in role, goal and backstory resolved
    pub fn interpolated(&self, inputs: &Inputs) -> Result<Self> {
        Ok(Self {
            role: interpolate_inputs(&self.role, inputs)?,
            goal: interpolate_inputs(&self.goal, inputs)?,
            backstory: interpolate_inputs(&self.backstory, inputs)?,
            ..self.clone()
        })
    }
}
