//! Memory bundle attached to a crew and the prompt context built from it

use crate::{
    EmbedderConfig, EntityMemory, LongTermMemory, RagStorage, Result, ShortTermMemory,
};
use crew_llm::EmbeddingProvider;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Rows of long-term memory consulted per task
const LONG_TERM_LATEST_N: usize = 2;
/// Short-term and entity hits consulted per task
const SEARCH_LIMIT: usize = 3;

/// The memory stores a crew runs with; any of them may be absent
#[derive(Clone, Default)]
pub struct CrewMemory {
    pub long_term: Option<Arc<LongTermMemory>>,
    pub short_term: Option<Arc<ShortTermMemory>>,
    pub entity: Option<Arc<EntityMemory>>,
}

impl CrewMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open all three stores: SQLite at `long_term_path`, `short_term.json`
    /// and `entities.json` under `dir`
    pub async fn open(
        long_term_path: impl AsRef<Path>,
        dir: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &EmbedderConfig,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let long_term = LongTermMemory::open(long_term_path)?;
        let short_term = RagStorage::open("short_term", dir, Arc::clone(&embedder), config).await?;
        let entity = RagStorage::open("entities", dir, embedder, config).await?;

        Ok(Self::new()
            .with_long_term(long_term)
            .with_short_term(ShortTermMemory::new(short_term))
            .with_entity(EntityMemory::new(entity)))
    }

    pub fn with_long_term(mut self, memory: LongTermMemory) -> Self {
        self.long_term = Some(Arc::new(memory));
        self
    }

    pub fn with_short_term(mut self, memory: ShortTermMemory) -> Self {
        self.short_term = Some(Arc::new(memory));
        self
    }

    pub fn with_entity(mut self, memory: EntityMemory) -> Self {
        self.entity = Some(Arc::new(memory));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.long_term.is_none() && self.short_term.is_none() && self.entity.is_none()
    }

    pub fn contextual(&self) -> ContextualMemory {
        ContextualMemory {
            memory: self.clone(),
        }
    }

    /// Clear every attached store
    pub async fn reset(&self) -> Result<()> {
        if let Some(ltm) = &self.long_term {
            ltm.reset()?;
        }
        if let Some(stm) = &self.short_term {
            stm.reset().await?;
        }
        if let Some(entity) = &self.entity {
            entity.reset().await?;
        }
        Ok(())
    }
}

/// Renders what the stores know about a task into prompt text
pub struct ContextualMemory {
    memory: CrewMemory,
}

impl ContextualMemory {
    /// Sections "Historical Data", "Recent Insights" and "Entities", each only
    /// when it has content, separated by newlines
    pub async fn build_context(&self, task_description: &str, query: &str) -> Result<String> {
        let sections = [
            self.long_term_context(task_description)?,
            self.short_term_context(query).await?,
            self.entity_context(query).await?,
        ];

        Ok(sections
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn long_term_context(&self, task_description: &str) -> Result<Option<String>> {
        let Some(ltm) = &self.memory.long_term else {
            return Ok(None);
        };

        let mut seen = BTreeSet::new();
        let suggestions: Vec<String> = ltm
            .search(task_description, LONG_TERM_LATEST_N)?
            .iter()
            .flat_map(|item| item.suggestions())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        Ok(bulleted("Historical Data", &suggestions))
    }

    async fn short_term_context(&self, query: &str) -> Result<Option<String>> {
        let Some(stm) = &self.memory.short_term else {
            return Ok(None);
        };
        let texts: Vec<String> = stm
            .search(query, SEARCH_LIMIT)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect();
        Ok(bulleted("Recent Insights", &texts))
    }

    async fn entity_context(&self, query: &str) -> Result<Option<String>> {
        let Some(entity) = &self.memory.entity else {
            return Ok(None);
        };
        let texts: Vec<String> = entity
            .search(query, SEARCH_LIMIT)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect();
        Ok(bulleted("Entities", &texts))
    }
}

fn bulleted(title: &str, lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let body: Vec<String> = lines.iter().map(|l| format!("- {l}")).collect();
    Some(format!("{title}:\n{}", body.join("\n")))
}
