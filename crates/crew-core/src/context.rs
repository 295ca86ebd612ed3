//! Execution context for a crew run
//!
//! A [`Context`] travels with a single kickoff. It carries the runtime
//! [`Inputs`], the run identifier, and the raw outputs of tasks finished so
//! far, plus a free-form key-value area for anything else.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Well-known context keys
pub mod keys {
    /// Identifier of the current kickoff
    pub const RUN_ID: &str = "run_id";
    /// Name of the task being executed
    pub const CURRENT_TASK: &str = "current_task";
}

/// Runtime inputs supplied once per kickoff (e.g. `topic`, `current_year`)
///
/// Keys are kept sorted so prompts rendered from them are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inputs(BTreeMap<String, serde_json::Value>);

impl Inputs {
    /// Create an empty input set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an input
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw JSON value of an input
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Input rendered as text: strings verbatim, everything else as JSON
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Iterate over inputs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Number of inputs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no inputs were supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for Inputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Context passed to agents during a run
///
/// # Example
///
/// ```
/// use crew_core::{Context, Inputs};
///
/// let ctx = Context::new()
///     .with_inputs(Inputs::new().with("topic", "AI LLMs"))
///     .with_run_id("run-1");
///
/// assert_eq!(ctx.inputs().get_text("topic").as_deref(), Some("AI LLMs"));
/// assert_eq!(ctx.run_id(), Some("run-1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    inputs: Inputs,
    outputs: HashMap<String, String>,
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Attach the runtime inputs
    pub fn with_inputs(mut self, inputs: Inputs) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the run identifier
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.insert(keys::RUN_ID, serde_json::json!(run_id.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Runtime inputs of this run
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Identifier of this run
    pub fn run_id(&self) -> Option<&str> {
        self.get(keys::RUN_ID).and_then(|v| v.as_str())
    }

    /// Name of the task currently executing
    pub fn current_task(&self) -> Option<&str> {
        self.get(keys::CURRENT_TASK).and_then(|v| v.as_str())
    }

    /// Mark a task as the one currently executing
    pub fn set_current_task(&mut self, task: impl Into<String>) {
        self.insert(keys::CURRENT_TASK, serde_json::json!(task.into()));
    }

    /// Record the raw output of a finished task
    pub fn record_output(&mut self, task: impl Into<String>, output: impl Into<String>) {
        self.outputs.insert(task.into(), output.into());
    }

    /// Raw output of a finished task
    pub fn output(&self, task: &str) -> Option<&str> {
        self.outputs.get(task).map(String::as_str)
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value, serialized to JSON
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value, deserialized from JSON
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }
}
