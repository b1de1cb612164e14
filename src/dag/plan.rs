// src/dag/plan.rs

//! Expansion of a requested task into ordered stages.
//!
//! A stage is a set of root tasks that the scheduler runs to completion
//! (together with their transitive prerequisites) before the next stage is
//! started. Sequence-bodied tasks are flattened here; the scheduler never
//! sees them.

use std::fmt;

use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};
use crate::registry::{TaskBody, TaskRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub roots: Vec<TaskName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub stages: Vec<Stage>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Every root of every stage, in execution order.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.stages
            .iter()
            .flat_map(|s| s.roots.iter().map(|r| r.as_str()))
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "  stage {}: {}", i + 1, stage.roots.join(", "))?;
        }
        Ok(())
    }
}

/// Plan for invoking `name`.
///
/// A sequence-bodied task becomes one stage of its prerequisites (if any)
/// followed by the expansion of each step. Any other task is a single stage.
pub fn plan_for_task(registry: &TaskRegistry, name: &str) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::default();
    let mut path = Vec::new();
    expand(registry, name, &mut plan.stages, &mut path)?;
    Ok(plan)
}

/// Plan for running `steps` strictly one after another.
pub fn plan_for_sequence<S: AsRef<str>>(
    registry: &TaskRegistry,
    steps: &[S],
) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::default();
    let mut path = Vec::new();
    for step in steps {
        expand(registry, step.as_ref(), &mut plan.stages, &mut path)?;
    }
    Ok(plan)
}

fn expand(
    registry: &TaskRegistry,
    name: &str,
    stages: &mut Vec<Stage>,
    path: &mut Vec<TaskName>,
) -> Result<()> {
    let spec = registry.require(name)?;

    match &spec.body {
        TaskBody::Sequence(steps) => {
            if path.iter().any(|p| p == name) {
                return Err(AssetdagError::DagCycle(format!(
                    "sequence '{name}' contains itself (via {})",
                    path.join(" -> ")
                )));
            }
            path.push(name.to_string());

            if !spec.prerequisites.is_empty() {
                stages.push(Stage {
                    roots: spec.prerequisites.clone(),
                });
            }
            for step in steps {
                expand(registry, step, stages, path)?;
            }

            path.pop();
        }
        _ => stages.push(Stage {
            roots: vec![name.to_string()],
        }),
    }

    Ok(())
}
