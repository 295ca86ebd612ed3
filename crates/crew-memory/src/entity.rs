//! Entity memory: companies, people and products seen in task outputs

use crate::{RagStorage, Result, ScoredRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Similarity below which an entity is not considered relevant
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.35;

/// An entity extracted by the task evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMemoryItem {
    /// Entity name, e.g. "NVIDIA"
    pub name: String,
    /// Entity type, e.g. "company"
    #[serde(rename = "type", alias = "entity_type")]
    pub entity_type: String,
    /// Short description
    pub description: String,
    /// Relationships to other entities, as free text
    #[serde(default)]
    pub relationships: String,
}

impl EntityMemoryItem {
    /// Text that is embedded and stored for this entity
    pub fn text(&self) -> String {
        format!("{}({}): {}", self.name, self.entity_type, self.description)
    }
}

/// Entity memory over a [`RagStorage`] of kind `entities`
pub struct EntityMemory {
    storage: RagStorage,
}

impl EntityMemory {
    pub fn new(storage: RagStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &RagStorage {
        &self.storage
    }

    pub async fn save(&self, item: &EntityMemoryItem) -> Result<String> {
        let metadata = json!({
            "name": item.name,
            "type": item.entity_type,
            "relationships": item.relationships,
        });
        self.storage.save(&item.text(), metadata, None).await
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredRecord>> {
        self.storage
            .search(query, limit, DEFAULT_SCORE_THRESHOLD)
            .await
    }

    pub async fn reset(&self) -> Result<()> {
        self.storage.reset().await
    }
}
