// src/engine/mod.rs

//! Orchestration engine for assetdag.
//!
//! This module ties together:
//! - the stage scheduler and the sequencer
//! - the run queue (what happens when requests arrive while a run is active)
//! - the main runtime event loop that reacts to:
//!   - run requests (CLI target, watch bindings)
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

use crate::types::{BuildMode, ReloadKind};

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Exit code of a process, or -1 for failures that have none.
    Failed(i32),
}

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The task named on the command line.
    Manual,
    /// A watch binding matched a filesystem event.
    FileWatch,
}

/// What a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    /// A registered task, expanded with [`crate::dag::plan_for_task`].
    Task(TaskName),
    /// An ad-hoc ordered list of tasks (a watch binding's `run`).
    Sequence { label: String, steps: Vec<TaskName> },
}

impl RunTarget {
    pub fn label(&self) -> &str {
        match self {
            RunTarget::Task(name) => name,
            RunTarget::Sequence { label, .. } => label,
        }
    }

    /// Top-level steps; a task target is a one-step sequence.
    pub fn steps(&self) -> Vec<TaskName> {
        match self {
            RunTarget::Task(name) => vec![name.clone()],
            RunTarget::Sequence { steps, .. } => steps.clone(),
        }
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Task(name) => write!(f, "{name}"),
            RunTarget::Sequence { label, steps } => write!(f, "{label} [{}]", steps.join(" -> ")),
        }
    }
}

/// A request to execute one target to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub target: RunTarget,
    /// Mode requested by the caller; a task's forced mode wins over it.
    pub mode: BuildMode,
    /// Browser reload to send after the run succeeded.
    pub reload: Option<ReloadKind>,
    pub reason: TriggerReason,
}

impl RunRequest {
    pub fn task(name: impl Into<TaskName>, mode: BuildMode) -> Self {
        Self {
            target: RunTarget::Task(name.into()),
            mode,
            reload: None,
            reason: TriggerReason::Manual,
        }
    }

    pub fn sequence(
        label: impl Into<String>,
        steps: Vec<TaskName>,
        mode: BuildMode,
        reload: Option<ReloadKind>,
    ) -> Self {
        Self {
            target: RunTarget::Sequence {
                label: label.into(),
                steps,
            },
            mode,
            reload,
            reason: TriggerReason::FileWatch,
        }
    }

    /// Fold `later` into this request so one run covers both.
    ///
    /// Steps of `later` not already present are appended in order, the
    /// reload becomes the one covering both, and `later`'s mode wins.
    pub fn absorb(&mut self, later: RunRequest) {
        let mut steps = self.target.steps();
        for step in later.target.steps() {
            if !steps.contains(&step) {
                steps.push(step);
            }
        }

        let label = if self.target.label().split('+').any(|l| l == later.target.label()) {
            self.target.label().to_string()
        } else {
            format!("{}+{}", self.target.label(), later.target.label())
        };

        self.target = RunTarget::Sequence { label, steps };
        self.mode = later.mode;
        self.reload = match (self.reload, later.reload) {
            (Some(a), Some(b)) => Some(a.covering(b)),
            (a, b) => a.or(b),
        };
        if later.reason == TriggerReason::FileWatch {
            self.reason = TriggerReason::FileWatch;
        }
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once no run is active and nothing is queued (one-shot tasks).
    pub exit_when_idle: bool,
    /// Exit if the very first run fails (`serve` startup).
    pub exit_on_initial_failure: bool,
}

/// Events flowing into the runtime from the driver, watchers and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    RunRequested(RunRequest),
    /// A task body finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod report;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use report::{RunFailure, RunReport};
pub use runtime::Runtime;
pub use crate::types::TriggerWhileRunningBehaviour;
