//! Memory stores for crew pipelines
//!
//! Three stores cooperate during a run:
//!
//! - [`LongTermMemory`]: task evaluations persisted in SQLite across runs
//! - [`ShortTermMemory`]: raw task outputs, searched by embedding similarity
//! - [`EntityMemory`]: people, companies and products mentioned in outputs
//!
//! [`ContextualMemory`] queries all three and renders one block of text that
//! is appended to a task prompt.

pub mod contextual;
pub mod entity;
pub mod error;
pub mod long_term;
pub mod rag;
pub mod short_term;

pub use contextual::{ContextualMemory, CrewMemory};
pub use entity::{EntityMemory, EntityMemoryItem};
pub use error::{MemoryError, Result};
pub use long_term::{LongTermMemory, LongTermMemoryItem, LtmSqliteStorage};
pub use rag::{EmbedderConfig, MemoryRecord, RagStorage, ScoredRecord};
pub use short_term::ShortTermMemory;

#[cfg(test)]
pub(crate) mod testing;
