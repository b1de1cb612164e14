// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::engine::TaskName;
use crate::types::BuildMode;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on prerequisites.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    /// Failed in this run, or blocked by a failed prerequisite.
    DoneFailed,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Static task information plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct prerequisites.
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this task failed.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// All tasks dispatched for the same stage share a `run_id`.
    pub run_id: u64,
    pub mode: BuildMode,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64, mode: BuildMode) -> Self {
        Self {
            name: info.name.clone(),
            run_id,
            mode,
        }
    }
}
