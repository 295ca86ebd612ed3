//! How a crew assigns tasks to agents

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Each task runs on its configured agent, in graph order
    #[default]
    Sequential,
    /// A manager agent runs every task and delegates to the workers
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Hierarchical => f.write_str("hierarchical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_serde() {
        assert_eq!(Process::default(), Process::Sequential);
        let process: Process = serde_json::from_str("\"hierarchical\"").unwrap();
        assert_eq!(process, Process::Hierarchical);
        assert_eq!(process.to_string(), "hierarchical");
    }
}
