//! Agent and task definitions loaded from YAML
//!
//! A crew is described by two documents in one directory: `agents.yaml`
//! maps agent keys to [`AgentConfig`] entries and `tasks.yaml` maps task keys
//! to [`TaskConfig`] entries. Both are validated as a whole when loaded, so a
//! malformed entry fails before any agent is built.

use crate::TaskConfig;
use crew_core::{Error, Result};
use crew_runtime::AgentConfig;
use crew_utils::load_yaml;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub const AGENTS_FILE: &str = "agents.yaml";
pub const TASKS_FILE: &str = "tasks.yaml";

/// Validated agent and task definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewConfig {
    pub agents: BTreeMap<String, AgentConfig>,
    pub tasks: BTreeMap<String, TaskConfig>,
}

impl CrewConfig {
    /// Load `agents.yaml` and `tasks.yaml` from `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Self::from_files(dir.join(AGENTS_FILE), dir.join(TASKS_FILE))
    }

    pub fn from_files(agents: impl AsRef<Path>, tasks: impl AsRef<Path>) -> Result<Self> {
        let config = Self {
            agents: load_yaml(agents).map_err(|e| Error::Configuration(e.to_string()))?,
            tasks: load_yaml(tasks).map_err(|e| Error::Configuration(e.to_string()))?,
        };
        config.validate()?;
        info!(
            agents = config.agents.len(),
            tasks = config.tasks.len(),
            "Loaded crew configuration"
        );
        Ok(config)
    }

    /// Parse both documents from YAML text
    pub fn from_yaml(agents: &str, tasks: &str) -> Result<Self> {
        let config = Self {
            agents: serde_yaml::from_str(agents)
                .map_err(|e| Error::Configuration(format!("Failed to parse {AGENTS_FILE}: {e}")))?,
            tasks: serde_yaml::from_str(tasks)
                .map_err(|e| Error::Configuration(format!("Failed to parse {TASKS_FILE}: {e}")))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every entry and every cross reference
    pub fn validate(&self) -> Result<()> {
        for (name, agent) in &self.agents {
            agent.validate(name)?;
        }

        for (name, task) in &self.tasks {
            task.validate(name)?;

            if let Some(agent) = &task.agent {
                if !self.agents.contains_key(agent) {
                    return Err(Error::Configuration(format!(
                        "Task '{name}' references unknown agent '{agent}'"
                    )));
                }
            }

            for dep in task.context.iter().flatten() {
                if !self.tasks.contains_key(dep) {
                    return Err(Error::Configuration(format!(
                        "Task '{name}' references unknown context task '{dep}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The agent entry named `key`
    pub fn agent(&self, key: &str) -> Result<AgentConfig> {
        self.agents
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Configuration(format!("No agent named '{key}' in {AGENTS_FILE}")))
    }

    /// The task entry named `key`
    pub fn task(&self, key: &str) -> Result<TaskConfig> {
        self.tasks
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Configuration(format!("No task named '{key}' in {TASKS_FILE}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::ErrorKind;
    use std::fs;

    const AGENTS: &str = "\
researcher:
  role: >
    {topic} Market Researcher
  goal: Find trending companies in {topic}
  backstory: Seasoned analyst
manager:
  role: Research Manager
  goal: Coordinate the team
  backstory: Runs the desk
  allow_delegation: true
";

    const TASKS: &str = "\
scan:
  description: Scan {topic} for {current_year}
  expected_output: A list of companies
  agent: researcher
report:
  description: Write the report
  expected_output: A report
  context: [scan]
";

    fn write(dir: &Path, agents: &str, tasks: &str) {
        fs::write(dir.join(AGENTS_FILE), agents).unwrap();
        fs::write(dir.join(TASKS_FILE), tasks).unwrap();
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), AGENTS, TASKS);

        let config = CrewConfig::load(dir.path()).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agent("researcher").unwrap().role.trim(), "{topic} Market Researcher");
        assert!(config.agent("manager").unwrap().allow_delegation);
        assert_eq!(config.task("report").unwrap().context, Some(vec!["scan".to_string()]));

        let err = config.agent("ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("No agent named 'ghost'"));
        assert!(config.task("ghost").is_err());
    }

    #[test]
    fn test_from_yaml_matches_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), AGENTS, TASKS);
        assert_eq!(
            CrewConfig::from_yaml(AGENTS, TASKS).unwrap(),
            CrewConfig::load(dir.path()).unwrap()
        );
        assert!(CrewConfig::from_yaml("- not a map", TASKS).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains(AGENTS_FILE));
    }

    #[test]
    fn test_missing_required_key() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "researcher:\n  role: R\n  goal: G\n", TASKS);
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("backstory"));
    }

    #[test]
    fn test_unknown_references() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            AGENTS,
            "scan:\n  description: d\n  expected_output: e\n  agent: ghost\n",
        );
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unknown agent 'ghost'"));

        write(
            dir.path(),
            AGENTS,
            "scan:\n  description: d\n  expected_output: e\n  context: [missing]\n",
        );
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unknown context task 'missing'"));
    }

    #[test]
    fn test_blank_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), AGENTS, "scan:\n  description: ' '\n  expected_output: e\n");
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("'description'"));
    }
}
