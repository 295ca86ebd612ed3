//! Tool trait definition

use async_trait::async_trait;
use crew_core::Result;
use crew_llm::ToolDefinition;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description and a JSON schema for its input.
/// The LLM sees all three and answers with a tool call whose arguments should
/// match the schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the arguments the LLM supplied
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique name within a [`ToolRegistry`](crate::ToolRegistry)
    fn name(&self) -> &str;

    /// Tells the LLM when to use this tool
    fn description(&self) -> &str;

    /// JSON schema of the expected arguments
    ///
    /// ```
    /// use crew_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({ "search_query": schema::string("Query to look up") }),
    ///     &["search_query"],
    /// );
    /// assert_eq!(schema["type"], "object");
    /// ```
    fn input_schema(&self) -> Value;

    /// Definition sent to the LLM provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
