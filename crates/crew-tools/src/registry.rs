//! Tool registry for managing available tools

use crate::Tool;
use crew_llm::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for managing tools
///
/// Tools are keyed by name; registering a second tool with the same name
/// replaces the first. Listing is in name order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the given tools
    pub fn with_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        registry.extend(tools);
        registry
    }

    /// Register a tool
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.insert(tool.name().to_string(), tool);
    }

    /// Register several tools
    pub fn extend(&self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) {
        let mut map = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        for tool in tools {
            map.insert(tool.name().to_string(), tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.get(name).cloned()
    }

    /// List all registered tools
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.values().cloned().collect()
    }

    /// Names of all registered tools
    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.keys().cloned().collect()
    }

    /// Tool definitions for an LLM request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(|t| t.definition()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        async fn execute(&self, _params: Value) -> crew_core::Result<Value> {
            Ok(json!(self.0))
        }

        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(Named("search_the_internet")));
        registry.register(Arc::new(Named("ask_question_to_coworker")));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("search_the_internet").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(
            registry.names(),
            vec!["ask_question_to_coworker", "search_the_internet"]
        );
    }

    #[test]
    fn test_same_name_replaces() {
        let registry =
            ToolRegistry::with_tools([Arc::new(Named("a")) as Arc<dyn Tool>, Arc::new(Named("a"))]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_definitions() {
        let registry = ToolRegistry::with_tools([Arc::new(Named("x")) as Arc<dyn Tool>]);
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "x");
        assert_eq!(defs[0].description, "test tool");
    }
}
