// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - forwarding reload notifications to the live-reload hub
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use std::sync::Arc;

use crate::dag::{Scheduler, Sequencer, Stage};
use crate::engine::queue::TriggerQueue;
use crate::engine::report::RunReport;
use crate::engine::{CoreStep, RunRequest, RuntimeEvent, RuntimeOptions, TaskName};
use crate::registry::TaskRegistry;
use crate::types::{BuildMode, TriggerWhileRunningBehaviour};

/// The run currently being executed.
#[derive(Debug)]
pub(super) struct ActiveRun {
    pub(super) request: RunRequest,
    pub(super) mode: BuildMode,
    pub(super) sequencer: Sequencer,
    /// Stage handed out by the sequencer but not yet submitted.
    pub(super) next_stage: Option<Stage>,
    /// Tasks of the running stage that failed so far.
    pub(super) stage_failures: Vec<TaskName>,
}

/// Pure core runtime state.
///
/// This owns:
/// - the task registry (shared, read-only)
/// - the stage scheduler
/// - the run queue
/// - at most one active run
/// - runtime options and the accumulated report
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    pub(super) registry: Arc<TaskRegistry>,
    pub(super) scheduler: Scheduler,
    pub(super) queue: TriggerQueue,
    pub(super) options: RuntimeOptions,
    pub(super) active: Option<ActiveRun>,
    pub(super) report: RunReport,
}

impl CoreRuntime {
    pub fn new(
        registry: Arc<TaskRegistry>,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        let scheduler = Scheduler::from_registry(&registry);
        Self {
            registry,
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            active: None,
            report: RunReport::default(),
        }
    }

    /// No run active and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested(request) => self.handle_run_request(request),
            RuntimeEvent::TaskCompleted { task, outcome } => {
                self.handle_task_completion(task, outcome)
            }
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
