//! Structured task outputs
//!
//! A task bound to an [`OutputSchema`] shows the LLM the JSON schema of the
//! expected type and validates the answer by deserializing it.

use crew_core::{Error, Result};
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

type Validator = fn(&str) -> std::result::Result<Value, String>;

/// JSON schema of an output type plus a validator for raw answers
#[derive(Clone)]
pub struct OutputSchema {
    name: String,
    schema: RootSchema,
    validator: Validator,
}

impl OutputSchema {
    /// Schema for `T`
    ///
    /// ```
    /// use crew_workflow::OutputSchema;
    /// use schemars::JsonSchema;
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize, Deserialize, JsonSchema)]
    /// struct Report {
    ///     summary: String,
    /// }
    ///
    /// let schema = OutputSchema::of::<Report>();
    /// assert_eq!(schema.name(), "Report");
    /// assert!(schema.validate(r#"{"summary": "ok"}"#).is_ok());
    /// assert!(schema.validate("{}").is_err());
    /// ```
    pub fn of<T>() -> Self
    where
        T: JsonSchema + DeserializeOwned + Serialize,
    {
        Self {
            name: T::schema_name(),
            schema: schemars::schema_for!(T),
            validator: validate_as::<T>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema as pretty-printed JSON
    pub fn json_schema(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.schema)
            .map_err(|e| Error::ProcessingFailed(format!("Failed to render schema {}: {e}", self.name)))
    }

    /// Extract the JSON object from `raw` and check it against the type
    ///
    /// Returns the normalized value (as re-serialized from the typed record).
    pub fn validate(&self, raw: &str) -> Result<Value> {
        (self.validator)(raw).map_err(|message| Error::validation(&self.name, message))
    }
}

impl fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSchema")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn validate_as<T>(raw: &str) -> std::result::Result<Value, String>
where
    T: DeserializeOwned + Serialize,
{
    let json = extract_json(raw).ok_or_else(|| "no JSON object found in output".to_string())?;
    let record: T = serde_json::from_str(json).map_err(|e| e.to_string())?;
    serde_json::to_value(&record).map_err(|e| e.to_string())
}

/// Locate the JSON object in an LLM answer
///
/// Accepts a bare object, a fenced code block (with or without a `json`
/// tag), or prose around an object, in which case the text from the first
/// `{` to the last `}` is taken.
pub fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}
