//! Tasks and their configuration entries

use crate::OutputSchema;
use crew_core::{Error, Inputs, Result};
use crew_runtime::interpolate_inputs;
use crew_runtime::prompts::{TaskPrompt, render_task_prompt};
use serde::{Deserialize, Serialize};

/// One task definition, as written in `tasks.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub description: String,
    pub expected_output: String,
    /// Key of the agent that runs this task in a sequential crew
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Tasks whose outputs this task reads; the previous task when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
}

impl TaskConfig {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            context: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_context<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context = Some(tasks.into_iter().map(Into::into).collect());
        self
    }

    /// Reject blank descriptions and expected outputs
    pub fn validate(&self, name: &str) -> Result<()> {
        for (field, value) in [
            ("description", &self.description),
            ("expected_output", &self.expected_output),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "Task '{name}' has an empty '{field}'"
                )));
            }
        }
        Ok(())
    }
}

/// A unit of work with an expected, optionally schema-validated output
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    config: TaskConfig,
    output_schema: Option<OutputSchema>,
}

impl Task {
    pub fn new(name: impl Into<String>, config: TaskConfig) -> Self {
        Self {
            name: name.into(),
            config,
            output_schema: None,
        }
    }

    /// Bind the task output to a schema
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn agent(&self) -> Option<&str> {
        self.config.agent.as_deref()
    }

    pub fn output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }

    /// Copy with `{name}` placeholders resolved from `inputs`
    pub fn interpolated(&self, inputs: &Inputs) -> Result<Self> {
        let mut config = self.config.clone();
        config.description = interpolate_inputs(&config.description, inputs)?;
        config.expected_output = interpolate_inputs(&config.expected_output, inputs)?;
        Ok(Self {
            config,
            ..self.clone()
        })
    }

    /// Prompt handed to the executing agent
    ///
    /// `context` holds the outputs of the tasks this one depends on and
    /// `memory` the contextual memory block; either may be absent.
    pub fn prompt(&self, context: Option<String>, memory: Option<String>) -> Result<String> {
        let output_schema = self
            .output_schema
            .as_ref()
            .map(OutputSchema::json_schema)
            .transpose()?;

        render_task_prompt(&TaskPrompt {
            description: &self.config.description,
            expected_output: &self.config.expected_output,
            output_schema,
            context: context.filter(|c| !c.trim().is_empty()),
            memory: memory.filter(|m| !m.trim().is_empty()),
        })
    }
}
