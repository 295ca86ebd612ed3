//! Short-term memory: raw task outputs from the current and recent runs

use crate::{RagStorage, Result, ScoredRecord};
use serde_json::Value;

/// Similarity below which a stored output is not considered relevant
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.35;

/// Short-term memory over a [`RagStorage`] of kind `short_term`
pub struct ShortTermMemory {
    storage: RagStorage,
}

impl ShortTermMemory {
    pub fn new(storage: RagStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &RagStorage {
        &self.storage
    }

    /// Store a task output produced by `agent`
    pub async fn save(&self, value: &str, metadata: Value, agent: Option<&str>) -> Result<String> {
        self.storage.save(value, metadata, agent).await
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
