// src/registry/mod.rs

//! Named tasks and their bodies.
//!
//! A [`TaskRegistry`] is built once at startup (usually through
//! [`TaskRegistry::standard`]) and then shared read-only by the planner,
//! the scheduler and the executor.

mod standard;

use std::collections::BTreeMap;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};
use crate::transform::SharedTransform;
use crate::types::BuildMode;

/// What a task does when it runs.
#[derive(Clone)]
pub enum TaskBody {
    /// Asset transforms, run concurrently.
    Transforms(Vec<SharedTransform>),
    /// Other tasks, run strictly one after another.
    Sequence(Vec<TaskName>),
    /// A shell command with inherited stdio.
    External { command: String },
    /// The development server and its watchers.
    Serve(ServeSpec),
    /// Stage the built site and hand it to the publisher command.
    Deploy(DeploySpec),
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::Transforms(ts) => {
                let names: Vec<&str> = ts.iter().map(|t| t.name()).collect();
                f.debug_tuple("Transforms").field(&names).finish()
            }
            TaskBody::Sequence(steps) => f.debug_tuple("Sequence").field(steps).finish(),
            TaskBody::External { command } => {
                f.debug_struct("External").field("command", command).finish()
            }
            TaskBody::Serve(spec) => f.debug_tuple("Serve").field(spec).finish(),
            TaskBody::Deploy(spec) => f.debug_tuple("Deploy").field(spec).finish(),
        }
    }
}

impl TaskBody {
    pub fn is_sequence(&self) -> bool {
        matches!(self, TaskBody::Sequence(_))
    }

    /// Short human-readable summary for `--dry-run`.
    pub fn summary(&self) -> String {
        match self {
            TaskBody::Transforms(ts) => {
                let names: Vec<&str> = ts.iter().map(|t| t.name()).collect();
                format!("transforms [{}]", names.join(", "))
            }
            TaskBody::Sequence(steps) => format!("sequence [{}]", steps.join(" -> ")),
            TaskBody::External { command } => format!("run `{command}`"),
            TaskBody::Serve(spec) => format!("serve {} on {}:{}", spec.root, spec.host, spec.port),
            TaskBody::Deploy(spec) => format!(
                "publish {} via `{}`",
                spec.site_dir, spec.command
            ),
        }
    }
}

/// Settings for the `serve` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSpec {
    pub host: String,
    pub port: u16,
    /// Served directory, relative to the project root.
    pub root: String,
}

/// Settings for the `deploy` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySpec {
    pub site_dir: String,
    pub staging_dir: String,
    /// Publisher command; `{dir}` is replaced by the staging directory.
    pub command: String,
}

/// A named, invokable unit of build work.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: TaskName,
    /// Tasks that must have succeeded (in the same run) before this one starts.
    pub prerequisites: Vec<TaskName>,
    pub body: TaskBody,
    /// Build mode this task always runs in, regardless of the CLI flag.
    pub forced_mode: Option<BuildMode>,
    pub description: String,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>, body: TaskBody) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            body,
            forced_mode: None,
            description: String::new(),
        }
    }

    pub fn after<S: AsRef<str>>(mut self, prerequisites: &[S]) -> Self {
        self.prerequisites = prerequisites.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn forcing(mut self, mode: BuildMode) -> Self {
        self.forced_mode = Some(mode);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mode for a run of this task given the mode requested on the CLI.
    pub fn effective_mode(&self, requested: BuildMode) -> BuildMode {
        self.forced_mode.unwrap_or(requested)
    }
}

/// All tasks known to this process, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskSpec>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Names are unique.
    pub fn register(&mut self, spec: TaskSpec) -> Result<()> {
        if self.tasks.contains_key(&spec.name) {
            return Err(AssetdagError::ConfigError(format!(
                "task '{}' is registered twice",
                spec.name
            )));
        }
        self.tasks.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    /// Like [`get`](Self::get) but reports unknown names as an error.
    pub fn require(&self, name: &str) -> Result<&TaskSpec> {
        self.get(name)
            .ok_or_else(|| AssetdagError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check references and acyclicity.
    ///
    /// This checks:
    /// - every prerequisite and sequence step names a registered task
    /// - no task depends on or contains itself
    /// - prerequisites never name a sequence-bodied task
    /// - the graph of prerequisite and step containment edges has no cycles
    pub fn validate(&self) -> Result<()> {
        for spec in self.tasks.values() {
            for dep in &spec.prerequisites {
                if dep == &spec.name {
                    return Err(AssetdagError::DagCycle(format!(
                        "task '{}' lists itself as a prerequisite",
                        spec.name
                    )));
                }
                let Some(target) = self.tasks.get(dep) else {
                    return Err(AssetdagError::TaskNotFound(format!(
                        "'{dep}' (prerequisite of '{}')",
                        spec.name
                    )));
                };
                if target.body.is_sequence() {
                    return Err(AssetdagError::ConfigError(format!(
                        "task '{}' lists sequence task '{dep}' as a prerequisite",
                        spec.name
                    )));
                }
            }

            if let TaskBody::Sequence(steps) = &spec.body {
                for step in steps {
                    if step == &spec.name {
                        return Err(AssetdagError::DagCycle(format!(
                            "sequence '{}' contains itself",
                            spec.name
                        )));
                    }
                    if !self.tasks.contains_key(step) {
                        return Err(AssetdagError::TaskNotFound(format!(
                            "'{step}' (step of '{}')",
                            spec.name
                        )));
                    }
                }
            }
        }

        // Edge direction: dep -> task, step -> owning sequence.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (name, spec) in &self.tasks {
            graph.add_node(name.as_str());
            for dep in &spec.prerequisites {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
            if let TaskBody::Sequence(steps) = &spec.body {
                for step in steps {
                    graph.add_edge(step.as_str(), name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(AssetdagError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
