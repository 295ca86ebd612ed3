//! Embedding-backed record storage
//!
//! Records live in memory and are mirrored to `<dir>/<kind>.json` after every
//! write, so a later run starts from what the previous run saved. Search
//! embeds the query and ranks records by cosine similarity.

use crate::{MemoryError, Result};
use chrono::{DateTime, Utc};
use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
use crew_llm::{EmbeddingProvider, EmbeddingRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Which embedding backend and model the stores use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Backend name; only `openai` (and compatible servers) is supported
    pub provider: String,
    /// Embedding model identifier
    pub model: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self::openai("text-embedding-3-small")
    }
}

impl EmbedderConfig {
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            provider: "openai".to_string(),
            model: model.into(),
        }
    }

    /// Build the embedding client described by this config
    pub fn build(
        &self,
        api_key: Option<&str>,
        api_base: Option<&str>,
    ) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.provider.as_str() {
            "openai" => {
                let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                    MemoryError::Config("OPENAI_API_KEY is required for openai embeddings".into())
                })?;
                let mut config = OpenAIConfig::new(api_key);
                if let Some(base) = api_base {
                    config = config.with_api_base(base);
                }
                Ok(Arc::new(OpenAIProvider::with_config(config)?))
            }
            other => Err(MemoryError::Config(format!(
                "Unsupported embedding provider '{other}'"
            ))),
        }
    }
}

/// A stored text with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub id: String,
    pub text: String,
    pub metadata: Value,
    pub agent: Option<String>,
    /// Cosine similarity with the query, in `[-1, 1]`
    pub score: f32,
}

/// Embedding-backed storage for one memory kind (`short_term`, `entities`)
pub struct RagStorage {
    kind: String,
    path: PathBuf,
    model: String,
    embedder: Arc<dyn EmbeddingProvider>,
    records: RwLock<Vec<MemoryRecord>>,
}

impl RagStorage {
    /// Open `<dir>/<kind>.json`, creating `dir` when missing
    pub async fn open(
        kind: impl Into<String>,
        dir: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &EmbedderConfig,
    ) -> Result<Self> {
        let kind = kind.into();
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| MemoryError::io(dir, e))?;

        let path = dir.join(format!("{kind}.json"));
        let records: Vec<MemoryRecord> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(MemoryError::io(&path, e)),
        };

        info!(kind = %kind, path = %path.display(), records = records.len(), "Opened memory storage");

        Ok(Self {
            kind,
            path,
            model: config.model.clone(),
            embedder,
            records: RwLock::new(records),
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Embed and store a text, returning the new record id
    pub async fn save(&self, text: &str, metadata: Value, agent: Option<&str>) -> Result<String> {
        let embedding = self.embed(text).await?;
        let record = MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            metadata,
            agent: agent.map(ToString::to_string),
            embedding,
            created_at: Utc::now(),
        };
        let id = record.id.clone();

        let mut records = self.records.write().await;
        records.push(record);
        self.persist(&records).await?;

        debug!(kind = %self.kind, id = %id, "Saved memory record");
        Ok(id)
    }

    /// Records most similar to `query`, best first
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredRecord>> {
        if limit == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed(query).await?;
        let records = self.records.read().await;

        let mut hits: Vec<ScoredRecord> = records
            .iter()
            .map(|r| (r, cosine_similarity(&query_embedding, &r.embedding)))
            .filter(|(_, score)| *score >= score_threshold)
            .map(|(r, score)| ScoredRecord {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                agent: r.agent.clone(),
                score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    /// Drop every record and delete the backing file
    pub async fn reset(&self) -> Result<()> {
        let mut records = self.records.write().await;
        records.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MemoryError::io(&self.path, e)),
        }
        info!(kind = %self.kind, "Reset memory storage");
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .embedder
            .embed(EmbeddingRequest::single(&self.model, text))
            .await?;
        response
            .into_first()
            .ok_or_else(|| MemoryError::Corrupt("Embedding backend returned no vector".into()))
    }

    /// Write to `<kind>.json.tmp`, then rename over `<kind>.json`, so the
    /// file on disk is always a complete snapshot
    async fn persist(&self, records: &[MemoryRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| MemoryError::io(&staging, e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| MemoryError::io(&self.path, e))
    }
}

/// Cosine similarity; zero when either vector is empty, zero-length or the
/// dimensions differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
