// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::registry::TaskRegistry;
use crate::types::BuildMode;

/// What changed in a single scheduler step.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// The failing task first, then the dependents it took down.
    pub newly_failed: Vec<TaskName>,
    /// This step ended the stage.
    pub run_just_finished: bool,
}

/// Scheduler holds the immutable prerequisite graph plus mutable per-run
/// state.
///
/// One scheduler run corresponds to one stage of an execution plan. It is
/// responsible for:
/// - pulling the transitive prerequisites of each root into the run
/// - deciding when a task is ready (all prerequisites succeeded)
/// - failing pending dependents when a task fails
/// - noticing when every participating task is terminal
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
    mode: BuildMode,
}

impl Scheduler {
    /// Construct a scheduler over a validated registry.
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let graph = DagGraph::from_registry(registry);

        let tasks = registry
            .iter()
            .map(|spec| {
                let deps = graph.dependencies_of(&spec.name).to_vec();
                (spec.name.clone(), TaskInfo::new(spec.name.clone(), deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
            mode: BuildMode::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Start a new run in `mode`, resetting per-run state but keeping history.
    pub fn start_new_run(&mut self, mode: BuildMode) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        self.mode = mode;

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, %mode, "scheduler: starting new run");
    }

    /// Add `root` (and its prerequisites) to the run; return ready tasks.
    pub fn handle_trigger(&mut self, root: &str) -> Vec<ScheduledTask> {
        self.trigger_step_internal(root).newly_scheduled
    }

    /// Record a task outcome; return newly ready tasks.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Clear `current_run_id` once every participating task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            debug!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; run finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }

    fn trigger_step_internal(&mut self, root: &str) -> SchedulerStep {
        if self.current_run_id.is_none() {
            warn!(
                task = %root,
                "handle_trigger called with no active run; implicitly starting a new run"
            );
            self.start_new_run(self.mode);
        }

        if self.tasks.contains_key(root) {
            let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
            manager.mark_task_and_prerequisites_pending(root);
        } else {
            warn!(task = %root, "trigger for unknown task; ignoring");
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let newly_scheduled = manager.collect_new_ready_tasks(self.mode);
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "handle_completion called with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state != Some(RunState::Running) => {
                warn!(
                    task = %info.name,
                    state = ?info.run_state,
                    "completion for task that is not running; ignoring"
                );
                return SchedulerStep::default();
            }
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    info!(task = %info.name, run_id, "task finished");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_tasks(self.mode));
                }
                TaskOutcome::Failed(code) => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(
                        task = %info.name,
                        run_id,
                        code,
                        "task failed; failing dependents in this run"
                    );
                    newly_failed.push(info.name.clone());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_failed.extend(manager.mark_dependents_failed(task));
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TaskBody, TaskSpec};

    fn scheduler() -> Scheduler {
        let mut registry = TaskRegistry::new();
        for spec in [
            TaskSpec::new("clean", TaskBody::Transforms(Vec::new())),
            TaskSpec::new("styles", TaskBody::Transforms(Vec::new())).after(&["clean"]),
            TaskSpec::new("scripts", TaskBody::Transforms(Vec::new())).after(&["clean"]),
            TaskSpec::new("img", TaskBody::Transforms(Vec::new())),
        ] {
            registry.register(spec).unwrap();
        }
        Scheduler::from_registry(&registry)
    }

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        let mut names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        names
    }

    #[test]
    fn prerequisites_run_first_then_dependents_together() {
        let mut s = scheduler();
        s.start_new_run(BuildMode::Development);

        let ready = s.handle_trigger("styles");
        assert_eq!(names(&ready), vec!["clean"]);
        let ready = s.handle_trigger("scripts");
        assert!(ready.is_empty());
        assert_eq!(s.run_state_of("img"), Some(TaskRunState::NotInRun));

        let ready = s.handle_completion("clean", TaskOutcome::Success);
        assert_eq!(names(&ready), vec!["scripts", "styles"]);
        assert!(ready.iter().all(|t| t.mode == BuildMode::Development));

        s.handle_completion("styles", TaskOutcome::Success);
        assert!(!s.is_idle());
        s.handle_completion("scripts", TaskOutcome::Success);
        assert!(s.is_idle());
    }

    #[test]
    fn failed_prerequisite_fails_pending_dependents() {
        let mut s = scheduler();
        s.start_new_run(BuildMode::Production);
        s.handle_trigger("styles");

        let ready = s.handle_completion("clean", TaskOutcome::Failed(1));
        assert!(ready.is_empty());
        assert_eq!(s.run_state_of("styles"), Some(TaskRunState::DoneFailed));
        assert!(s.is_idle());
        assert_eq!(s.run_state_of("nope"), None);
    }
}
