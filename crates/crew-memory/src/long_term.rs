//! Long-term memory persisted in SQLite
//!
//! Each finished task leaves one row: the task description, the evaluator's
//! metadata (suggestions, quality, agent, expected output) and a score.
//! Later runs of the same task read the newest rows back as "Historical Data".

use crate::{MemoryError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// One evaluated task execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermMemoryItem {
    /// Description of the task as it was executed
    pub task_description: String,
    /// Evaluator output and execution details
    pub metadata: Value,
    /// When the task finished
    pub datetime: DateTime<Utc>,
    /// Quality score; lower is returned first among equal timestamps
    pub score: f64,
}

impl LongTermMemoryItem {
    pub fn new(task_description: impl Into<String>, metadata: Value, score: f64) -> Self {
        Self {
            task_description: task_description.into(),
            metadata,
            datetime: Utc::now(),
            score,
        }
    }

    /// Suggestions recorded by the evaluator, if any
    pub fn suggestions(&self) -> Vec<String> {
        self.metadata
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// SQLite table holding long-term memory rows
pub struct LtmSqliteStorage {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl LtmSqliteStorage {
    /// Open the database, creating the parent directory and table on first use
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MemoryError::io(parent, e))?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS long_term_memories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_description TEXT NOT NULL,
                metadata TEXT NOT NULL,
                datetime TEXT NOT NULL,
                score REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_ltm_task ON long_term_memories(task_description);
            ",
        )?;

        info!(path = %path.display(), "Opened long-term memory storage");

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Database file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, item: &LongTermMemoryItem) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO long_term_memories (task_description, metadata, datetime, score)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.task_description,
                serde_json::to_string(&item.metadata)?,
                item.datetime.to_rfc3339_opts(SecondsFormat::Micros, true),
                item.score,
            ],
        )?;
        debug!(task = %item.task_description, score = item.score, "Saved long-term memory");
        Ok(())
    }

    /// Newest `latest_n` rows for a task description
    pub fn load(&self, task_description: &str, latest_n: usize) -> Result<Vec<LongTermMemoryItem>> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            r"
            SELECT task_description, metadata, datetime, score
            FROM long_term_memories
            WHERE task_description = ?1
            ORDER BY datetime DESC, score ASC
            LIMIT ?2
            ",
        )?;

        let rows = stmt
            .query_map(params![task_description, latest_n as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(task_description, metadata, datetime, score)| {
                let datetime = DateTime::parse_from_rfc3339(&datetime)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| MemoryError::Corrupt(format!("Bad stored datetime '{datetime}': {e}")))?;
                Ok(LongTermMemoryItem {
                    task_description,
                    metadata: serde_json::from_str(&metadata)?,
                    datetime,
                    score,
                })
            })
            .collect()
    }

    /// Delete every row
    pub fn reset(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        conn.execute("DELETE FROM long_term_memories", [])?;
        info!(path = %self.path.display(), "Reset long-term memory");
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| MemoryError::LockPoisoned)?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM long_term_memories", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Long-term memory facade used by the crew
pub struct LongTermMemory {
    storage: LtmSqliteStorage,
}

impl LongTermMemory {
    pub fn new(storage: LtmSqliteStorage) -> Self {
        Self { storage }
    }

    /// Open storage at `path` and wrap it
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(LtmSqliteStorage::open(path)?))
    }

    pub fn storage(&self) -> &LtmSqliteStorage {
        &self.storage
    }

    pub fn save(&self, item: &LongTermMemoryItem) -> Result<()> {
        self.storage.save(item)
    }

    pub fn search(&self, task_description: &str, latest_n: usize) -> Result<Vec<LongTermMemoryItem>> {
        self.storage.load(task_description, latest_n)
    }

    pub fn reset(&self) -> Result<()> {
        self.storage.reset()
    }
}
