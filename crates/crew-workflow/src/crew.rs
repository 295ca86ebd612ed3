//! Crew definition and execution
//!
//! A crew runs its tasks one at a time in [`TaskGraph`] order. Each task
//! prompt carries the outputs of the tasks it depends on and, when memory is
//! attached, what the memory stores know about it. Outputs bound to a schema
//! are validated before the next task starts; any failure aborts the run.

use crate::evaluator::remember;
use crate::schema::extract_json;
use crate::{Process, Task, TaskEvaluator, TaskGraph};
use crew_core::{Agent, Context, Error, Inputs, Result};
use crew_llm::{ResponseFormat, TokenUsage};
use crew_memory::CrewMemory;
use crew_runtime::{CrewAgent, delegation_tools};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const CONTEXT_DIVIDER: &str = "\n\n----------\n\n";

/// Result of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task key
    pub name: String,
    /// Task description with inputs resolved
    pub description: String,
    /// Role of the agent that produced the output
    pub agent: String,
    /// Answer text as returned by the agent
    pub raw: String,
    /// Validated value, for tasks bound to a schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
}

impl TaskOutput {
    /// Deserialize the output into `T`
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T> {
        typed_value(self.structured.as_ref(), &self.raw)
    }
}

/// Result of a whole crew run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Every task output, in execution order
    pub tasks_output: Vec<TaskOutput>,
    /// Raw answer of the last task
    pub raw: String,
    /// Validated value of the last task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
    /// Tokens spent by agents, delegated coworkers and the evaluator
    pub token_usage: TokenUsage,
}

impl CrewOutput {
    /// Deserialize the final output into `T`
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T> {
        typed_value(self.structured.as_ref(), &self.raw)
    }

    /// Output of the task named `name`
    pub fn task(&self, name: &str) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|output| output.name == name)
    }
}

fn typed_value<T: DeserializeOwned>(structured: Option<&Value>, raw: &str) -> Result<T> {
    let type_name = std::any::type_name::<T>();
    match structured {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Error::validation(type_name, e.to_string())),
        None => {
            let json = extract_json(raw)
                .ok_or_else(|| Error::validation(type_name, "no JSON object found in output"))?;
            serde_json::from_str(json).map_err(|e| Error::validation(type_name, e.to_string()))
        }
    }
}

/// Agents, tasks, a process and optional memory, ready to run
///
/// # Example
///
/// ```no_run
/// use crew_workflow::{Crew, Process, Task, TaskConfig};
/// # use crew_runtime::CrewAgent;
///
/// # async fn example(researcher: CrewAgent, manager: CrewAgent) -> crew_core::Result<()> {
/// let crew = Crew::builder()
///     .agent(researcher)
///     .task(Task::new("scan", TaskConfig::new("Scan {topic}", "A list of companies")))
///     .process(Process::Hierarchical)
///     .manager_agent(manager)
///     .build()?;
///
/// let output = crew
///     .kickoff(crew_core::Inputs::new().with("topic", "AI LLMs"))
///     .await?;
/// println!("{}", output.raw);
/// # Ok(())
/// # }
/// ```
pub struct Crew {
    agents: Vec<CrewAgent>,
    tasks: Vec<Task>,
    graph: TaskGraph,
    process: Process,
    manager: Option<CrewAgent>,
    memory: CrewMemory,
    evaluator: Option<TaskEvaluator>,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    pub fn agents(&self) -> &[CrewAgent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn manager(&self) -> Option<&CrewAgent> {
        self.manager.as_ref()
    }

    pub fn memory(&self) -> &CrewMemory {
        &self.memory
    }

    /// Clear every attached memory store
    pub async fn reset_memories(&self) -> Result<()> {
        self.memory.reset().await?;
        Ok(())
    }

    /// Run every task once with `inputs` resolved into agent and task texts
    pub async fn kickoff(&self, inputs: Inputs) -> Result<CrewOutput> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            process = %self.process,
            tasks = self.tasks.len(),
            agents = self.agents.len(),
            "Crew kickoff"
        );

        let usage_before = self.agent_usage();
        let workers = self
            .agents
            .iter()
            .map(|agent| agent.with_inputs(&inputs))
            .collect::<Result<Vec<_>>>()?;
        let manager = self.prepare_manager(&workers, &inputs)?;

        let mut context = Context::new()
            .with_inputs(inputs.clone())
            .with_run_id(run_id.clone());
        let mut tasks_output = Vec::with_capacity(self.tasks.len());
        let mut evaluation_usage = TokenUsage::default();

        for &index in self.graph.order() {
            let task = self.tasks[index].interpolated(&inputs)?;
            let agent = match &manager {
                Some(manager) => manager,
                None => assigned_agent(&task, &workers)?,
            };
            context.set_current_task(task.name());

            let dependency_context = self.dependency_context(index, &context);
            let memory_context = self.memory_context(&task).await?;
            let prompt = task.prompt(dependency_context, memory_context)?;

            info!(task = %task.name(), agent = %agent.role(), "Task started");
            let response_format = task.output_schema().map(|_| ResponseFormat::JsonObject);
            let execution = agent.execute_task(prompt, response_format).await?;

            let structured = task
                .output_schema()
                .map(|schema| schema.validate(&execution.text))
                .transpose()?;

            context.record_output(task.name(), execution.text.clone());
            let output = TaskOutput {
                name: task.name().to_string(),
                description: task.description().to_string(),
                agent: agent.role().to_string(),
                raw: execution.text,
                structured,
            };
            info!(
                task = %output.name,
                iterations = execution.iterations,
                forced = execution.forced,
                "Task completed"
            );

            evaluation_usage.add(self.remember(&task, &output).await);
            tasks_output.push(output);
        }

        let mut token_usage = usage_since(usage_before, self.agent_usage());
        token_usage.add(evaluation_usage);

        let (raw, structured) = tasks_output
            .last()
            .map(|last| (last.raw.clone(), last.structured.clone()))
            .unwrap_or_default();

        info!(run_id = %run_id, tokens = token_usage.total(), "Crew finished");
        Ok(CrewOutput {
            tasks_output,
            raw,
            structured,
            token_usage,
        })
    }

    /// The manager with inputs resolved and delegation tools over `workers`
    fn prepare_manager(&self, workers: &[CrewAgent], inputs: &Inputs) -> Result<Option<CrewAgent>> {
        if self.process != Process::Hierarchical {
            return Ok(None);
        }
        let manager = self.manager.as_ref().ok_or_else(|| {
            Error::Configuration("Hierarchical process requires a manager agent".to_string())
        })?;

        let coworkers: Vec<Arc<dyn Agent>> = workers
            .iter()
            .map(|worker| Arc::new(worker.clone()) as Arc<dyn Agent>)
            .collect();
        Ok(Some(
            manager
                .with_inputs(inputs)?
                .with_extra_tools(delegation_tools(coworkers)),
        ))
    }

    fn dependency_context(&self, index: usize, context: &Context) -> Option<String> {
        let outputs: Vec<&str> = self
            .graph
            .dependencies(index)
            .iter()
            .filter_map(|&dep| context.output(self.tasks[dep].name()))
            .collect();
        (!outputs.is_empty()).then(|| outputs.join(CONTEXT_DIVIDER))
    }

    async fn memory_context(&self, task: &Task) -> Result<Option<String>> {
        if self.memory.is_empty() {
            return Ok(None);
        }
        let text = self
            .memory
            .contextual()
            .build_context(task.description(), task.description())
            .await?;
        debug!(task = %task.name(), chars = text.len(), "Built memory context");
        Ok(Some(text))
    }

    /// Save the output to short-term memory and evaluate it into long-term
    /// and entity memory; failures are logged and skipped
    async fn remember(&self, task: &Task, output: &TaskOutput) -> TokenUsage {
        if let Some(stm) = &self.memory.short_term {
            let metadata = json!({ "task": task.name(), "observation": task.description() });
            if let Err(e) = stm.save(&output.raw, metadata, Some(&output.agent)).await {
                warn!(task = %task.name(), error = %e, "Failed to save short-term memory");
            }
        }

        let Some(evaluator) = &self.evaluator else {
            return TokenUsage::default();
        };
        if self.memory.long_term.is_none() && self.memory.entity.is_none() {
            return TokenUsage::default();
        }

        let expected_output = &task.config().expected_output;
        match evaluator
            .evaluate(task.description(), expected_output, &output.raw)
            .await
        {
            Ok((evaluation, usage)) => {
                if let Err(e) = remember(
                    &self.memory,
                    task.description(),
                    expected_output,
                    &output.agent,
                    &evaluation,
                )
                .await
                {
                    warn!(task = %task.name(), error = %e, "Failed to store task evaluation");
                }
                usage
            }
            Err(e) => {
                warn!(task = %task.name(), error = %e, "Task evaluation failed");
                TokenUsage::default()
            }
        }
    }

    /// Tokens counted so far by the workers and the manager
    fn agent_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for agent in self.agents.iter().chain(self.manager.iter()) {
            total.add(agent.usage());
        }
        total
    }
}

fn assigned_agent<'a>(task: &Task, workers: &'a [CrewAgent]) -> Result<&'a CrewAgent> {
    match task.agent() {
        Some(key) => workers
            .iter()
            .find(|worker| Agent::name(*worker) == key)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "Task '{}' is assigned to unknown agent '{key}'",
                    task.name()
                ))
            }),
        None => workers
            .first()
            .ok_or_else(|| Error::Configuration("Crew has no agents".to_string())),
    }
}

fn usage_since(before: TokenUsage, after: TokenUsage) -> TokenUsage {
    TokenUsage {
        input_tokens: after.input_tokens.saturating_sub(before.input_tokens),
        output_tokens: after.output_tokens.saturating_sub(before.output_tokens),
    }
}

/// Builder for [`Crew`]
#[derive(Default)]
pub struct CrewBuilder {
    agents: Vec<CrewAgent>,
    tasks: Vec<Task>,
    process: Process,
    manager: Option<CrewAgent>,
    memory: CrewMemory,
    evaluator: Option<TaskEvaluator>,
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(mut self, agent: CrewAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agents(mut self, agents: impl IntoIterator<Item = CrewAgent>) -> Self {
        self.agents.extend(agents);
        self
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    /// Agent that runs every task of a hierarchical crew
    pub fn manager_agent(mut self, manager: CrewAgent) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn memory(mut self, memory: CrewMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Evaluator feeding long-term and entity memory after each task
    pub fn evaluator(mut self, evaluator: TaskEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Validate the assembly and build the task graph
    pub fn build(self) -> Result<Crew> {
        if self.agents.is_empty() {
            return Err(Error::Configuration("Crew needs at least one agent".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(Error::Configuration("Crew needs at least one task".to_string()));
        }

        match (self.process, &self.manager) {
            (Process::Hierarchical, None) => {
                return Err(Error::Configuration(
                    "Hierarchical process requires a manager agent".to_string(),
                ));
            }
            (Process::Hierarchical, Some(manager)) => {
                let clash = self.agents.iter().any(|agent| {
                    Agent::name(agent) == Agent::name(manager) || agent.role() == manager.role()
                });
                if clash {
                    return Err(Error::Configuration(format!(
                        "Manager agent '{}' must not be listed among the crew's agents",
                        manager.role()
                    )));
                }
            }
            (Process::Sequential, _) => {
                for task in &self.tasks {
                    assigned_agent(task, &self.agents)?;
                }
            }
        }

        let graph = TaskGraph::build(&self.tasks)?;
        debug!(order = ?graph.order(), "Task graph built");

        Ok(Crew {
            agents: self.agents,
            tasks: self.tasks,
            graph,
            process: self.process,
            manager: self.manager,
            memory: self.memory,
            evaluator: self.evaluator,
        })
    }
}
