// src/dag/graph.rs

use std::collections::HashMap;

use crate::engine::TaskName;
use crate::registry::TaskRegistry;

/// Internal node structure: stores immediate prerequisites and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Tasks that must succeed before this one can run.
    deps: Vec<TaskName>,
    /// Tasks that list this one as a prerequisite.
    dependents: Vec<TaskName>,
}

/// Prerequisite graph keyed by task name.
///
/// Acyclicity is checked by [`TaskRegistry::validate`]; here we only keep
/// adjacency information for scheduling.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Build the graph from a validated registry.
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = registry
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    DagNode {
                        deps: spec.prerequisites.clone(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        for spec in registry.iter() {
            for dep in &spec.prerequisites {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(spec.name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
