//! Explicit dependency graph over a crew's tasks

use crate::Task;
use crew_core::{Error, Result};
use std::collections::{BTreeSet, HashMap};

/// Tasks as nodes, "reads the output of" as edges
///
/// A task with a `context` list depends on exactly the tasks it names; a
/// task without one depends on the task declared before it. Execution order
/// is topological, ties broken by declaration order.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    dependencies: Vec<Vec<usize>>,
    order: Vec<usize>,
}

impl TaskGraph {
    /// Build the graph, rejecting duplicate names, unknown dependencies and
    /// cycles
    pub fn build(tasks: &[Task]) -> Result<Self> {
        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.name(), i).is_some() {
                return Err(Error::Configuration(format!(
                    "Duplicate task name '{}'",
                    task.name()
                )));
            }
        }

        let mut dependencies = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            let deps = match &task.config().context {
                Some(names) => names
                    .iter()
                    .map(|name| {
                        index.get(name.as_str()).copied().ok_or_else(|| {
                            Error::Configuration(format!(
                                "Task '{}' depends on unknown task '{name}'",
                                task.name()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                None if i > 0 => vec![i - 1],
                None => Vec::new(),
            };
            dependencies.push(deps);
        }

        let order = topological_order(&dependencies).map_err(|stuck| {
            let names: Vec<&str> = stuck.iter().map(|&i| tasks[i].name()).collect();
            Error::Configuration(format!(
                "Task dependencies form a cycle among: {}",
                names.join(", ")
            ))
        })?;

        Ok(Self {
            dependencies,
            order,
        })
    }

    /// Task indices in execution order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Indices of the tasks `task` reads from
    pub fn dependencies(&self, task: usize) -> &[usize] {
        self.dependencies.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Kahn's algorithm; on a cycle returns the nodes that never became ready
fn topological_order(dependencies: &[Vec<usize>]) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let n = dependencies.len();
    let mut remaining: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut dependents = vec![Vec::new(); n];
    for (task, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(task);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err((0..n).filter(|&i| remaining[i] > 0).collect())
    }
}
