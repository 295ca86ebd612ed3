//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Core trait that all crew members implement
///
/// Input and output are plain strings: the task prompt goes in, the agent's
/// final answer comes out. Structured parsing of the answer happens at the
/// task layer, not here.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Work on a prompt and return the final answer
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Unique name of the agent (its configuration key)
    fn name(&self) -> &str;

    /// Role shown to coworkers and the manager; defaults to the name
    fn role(&self) -> &str {
        self.name()
    }
}
