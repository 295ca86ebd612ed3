//! Post-task evaluation feeding long-term and entity memory

use crate::schema::extract_json;
use crew_core::{Error, Result};
use crew_llm::{CompletionRequest, LLMProvider, Message, ResponseFormat, TokenUsage};
use crew_memory::{CrewMemory, EntityMemoryItem, LongTermMemoryItem};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

const EVALUATOR_SYSTEM: &str = "You are an expert at judging task results. \
You answer with a single JSON object and nothing else.";

/// Judgement of one task output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvaluation {
    /// Instructions that would make the next run of the task better
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Score from 0 to 10
    pub quality: f64,
    /// Entities mentioned in the output
    #[serde(default)]
    pub entities: Vec<EntityMemoryItem>,
}

/// Asks the LLM to score a task output and extract entities from it
pub struct TaskEvaluator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl TaskEvaluator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Score `output` against the task; returns the evaluation and the
    /// tokens spent on it
    pub async fn evaluate(
        &self,
        task_description: &str,
        expected_output: &str,
        output: &str,
    ) -> Result<(TaskEvaluation, TokenUsage)> {
        let prompt = format!(
            "Assess the quality of the task completed based on the description, expected \
             output, and actual results.\n\n\
             Task Description:\n{task_description}\n\n\
             Expected Output:\n{expected_output}\n\n\
             Actual Output:\n{output}\n\n\
             Please provide:\n\
             - Bullet points suggestions to improve future similar tasks\n\
             - A score from 0 to 10 evaluating on completion, quality, and overall performance\n\
             - Entities extracted from the task output, if any, their type, description, \
             and relationships\n\n\
             Answer with a JSON object of the form \
             {{\"suggestions\": [string], \"quality\": number, \"entities\": \
             [{{\"name\": string, \"type\": string, \"description\": string, \
             \"relationships\": string}}]}}"
        );

        let request = CompletionRequest::builder(&self.model)
            .system(EVALUATOR_SYSTEM)
            .add_message(Message::user(prompt))
            .response_format(ResponseFormat::JsonObject)
            .build();

        let response = self.provider.complete(request).await?;
        let text = response
            .message
            .text()
            .ok_or_else(|| Error::Llm("Evaluator returned no text".to_string()))?;
        let json = extract_json(&text)
            .ok_or_else(|| Error::validation("TaskEvaluation", "no JSON object found in output"))?;
        let evaluation: TaskEvaluation = serde_json::from_str(json)
            .map_err(|e| Error::validation("TaskEvaluation", e.to_string()))?;

        debug!(
            quality = evaluation.quality,
            suggestions = evaluation.suggestions.len(),
            entities = evaluation.entities.len(),
            "Task evaluated"
        );
        Ok((evaluation, response.usage))
    }
}

/// Store an evaluation: one long-term row plus one entity record per entity
pub async fn remember(
    memory: &CrewMemory,
    task_description: &str,
    expected_output: &str,
    agent_role: &str,
    evaluation: &TaskEvaluation,
) -> Result<()> {
    if let Some(ltm) = &memory.long_term {
        let metadata = json!({
            "suggestions": evaluation.suggestions,
            "quality": evaluation.quality,
            "agent": agent_role,
            "expected_output": expected_output,
        });
        ltm.save(&LongTermMemoryItem::new(
            task_description,
            metadata,
            evaluation.quality,
        ))?;
    }

    if let Some(entities) = &memory.entity {
        for entity in &evaluation.entities {
            entities.save(entity).await?;
        }
    }

    info!(
        agent = %agent_role,
        quality = evaluation.quality,
        entities = evaluation.entities.len(),
        "Stored task evaluation"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, StubEmbedder, text};
    use crew_core::ErrorKind;
    use crew_memory::{EmbedderConfig, EntityMemory, LongTermMemory, RagStorage};

    const EVALUATION: &str = r#"{
        "suggestions": ["Cite sources", "Include tickers"],
        "quality": 8.5,
        "entities": [
            {"name": "NVIDIA", "type": "company", "description": "GPU maker", "relationships": "supplies OpenAI"}
        ]
    }"#;

    #[tokio::test]
    async fn test_evaluate_parses_answer() {
        let provider = Arc::new(ScriptedProvider::new([text(EVALUATION)]));
        let evaluator = TaskEvaluator::new(provider.clone(), "gpt-4o-mini");

        let (evaluation, usage) = evaluator
            .evaluate("Scan the market", "A list", "NVIDIA is trending")
            .await
            .unwrap();
        assert_eq!(evaluation.quality, 8.5);
        assert_eq!(evaluation.suggestions.len(), 2);
        assert_eq!(evaluation.entities[0].entity_type, "company");
        assert_eq!(usage.total(), 15);

        let request = provider.request(0);
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));
        assert!(request.tools.is_none());
    }

    #[tokio::test]
    async fn test_evaluate_rejects_prose() {
        let provider = Arc::new(ScriptedProvider::new([text("Looks great to me")]));
        let evaluator = TaskEvaluator::new(provider, "gpt-4o-mini");
        let err = evaluator.evaluate("t", "e", "o").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_remember_feeds_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbedderConfig::default();
        let entity_storage = RagStorage::open("entities", dir.path(), Arc::new(StubEmbedder), &config)
            .await
            .unwrap();
        let memory = CrewMemory::new()
            .with_long_term(LongTermMemory::open(dir.path().join("ltm.db")).unwrap())
            .with_entity(EntityMemory::new(entity_storage));

        let evaluation: TaskEvaluation = serde_json::from_str(EVALUATION).unwrap();
        remember(&memory, "Scan the market", "A list", "Researcher", &evaluation)
            .await
            .unwrap();

        let rows = memory
            .long_term
            .as_ref()
            .unwrap()
            .search("Scan the market", 2)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 8.5);
        assert_eq!(rows[0].suggestions(), vec!["Cite sources", "Include tickers"]);
        assert_eq!(rows[0].metadata["agent"], "Researcher");

        assert_eq!(memory.entity.as_ref().unwrap().storage().len().await, 1);
    }
}
