// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::mem;

use tracing::{error, info, warn};

use crate::dag::{ScheduledTask, SequenceState, Sequencer, Stage, plan_for_sequence, plan_for_task};
use crate::engine::core::{ActiveRun, CoreRuntime};
use crate::engine::report::RunFailure;
use crate::engine::{RunRequest, RunTarget, TaskName, TaskOutcome};
use crate::types::{BuildMode, ReloadKind};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell connected browsers to reload.
    Reload(ReloadKind),
    /// Request that the process exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn from_commands(commands: Vec<CoreCommand>) -> Self {
        let keep_running = !commands.contains(&CoreCommand::RequestExit);
        Self {
            commands,
            keep_running,
        }
    }
}

impl CoreRuntime {
    /// Start `request` now, or hand it to the queue if a run is active.
    pub(super) fn handle_run_request(&mut self, request: RunRequest) -> CoreStep {
        if self.active.is_some() {
            self.queue.record_trigger(request);
            return CoreStep::from_commands(Vec::new());
        }

        let mut commands = Vec::new();
        if self.activate(request) {
            commands.push(CoreCommand::RequestExit);
        }
        let commands = self.drive(commands);
        CoreStep::from_commands(commands)
    }

    pub(super) fn handle_task_completion(
        &mut self,
        task: TaskName,
        outcome: TaskOutcome,
    ) -> CoreStep {
        let mut commands = Vec::new();
        let step = self.scheduler.step_completion(&task, outcome);

        if let Some(active) = self.active.as_mut() {
            active.stage_failures.extend(step.newly_failed);
        }
        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
        }
        if step.run_just_finished {
            self.stage_done();
        }

        let commands = self.drive(commands);
        CoreStep::from_commands(commands)
    }

    /// Expand `request` into a plan and make it the active run.
    ///
    /// A request that cannot be planned is recorded as failed immediately;
    /// returns `true` if that failure should end the process.
    fn activate(&mut self, request: RunRequest) -> bool {
        let (plan, mode) = match &request.target {
            RunTarget::Task(name) => {
                let mode = self
                    .registry
                    .get(name)
                    .map(|spec| spec.effective_mode(request.mode))
                    .unwrap_or(request.mode);
                (plan_for_task(&self.registry, name), mode)
            }
            RunTarget::Sequence { steps, .. } => {
                (plan_for_sequence(&self.registry, steps), request.mode)
            }
        };

        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                error!(run = %request.target, error = %err, "cannot plan run");
                let failure = RunFailure {
                    target: request.target.label().to_string(),
                    stage: 0,
                    tasks: Vec::new(),
                };
                return self.record_outcome(Some(failure));
            }
        };

        info!(
            run = %request.target,
            reason = ?request.reason,
            %mode,
            stages = plan.len(),
            "starting run"
        );

        let mut sequencer = Sequencer::new(plan);
        let next_stage = sequencer.start();
        self.active = Some(ActiveRun {
            request,
            mode,
            sequencer,
            next_stage,
            stage_failures: Vec::new(),
        });
        false
    }

    /// Advance until tasks are in flight or there is nothing left to do.
    fn drive(&mut self, mut commands: Vec<CoreCommand>) -> Vec<CoreCommand> {
        loop {
            if commands.contains(&CoreCommand::RequestExit) {
                return commands;
            }

            if self.active.is_none() {
                match self.queue.next_pending() {
                    Some(request) => {
                        if self.activate(request) {
                            commands.push(CoreCommand::RequestExit);
                        }
                        continue;
                    }
                    None => break,
                }
            }

            if !self.scheduler.is_idle() {
                return commands;
            }

            let next = self.active.as_mut().and_then(|a| a.next_stage.take());
            match next {
                Some(stage) => {
                    let mode = self.active.as_ref().map(|a| a.mode).unwrap_or_default();
                    commands.extend(self.submit_stage(stage, mode));
                }
                None => commands.extend(self.finish_run()),
            }
        }

        if self.options.exit_when_idle {
            info!("nothing left to run; exiting");
            commands.push(CoreCommand::RequestExit);
        }
        commands
    }

    /// Start a scheduler run for the roots of `stage`.
    fn submit_stage(&mut self, stage: Stage, mode: BuildMode) -> Vec<CoreCommand> {
        self.scheduler.start_new_run(mode);

        let mut ready = Vec::new();
        for root in &stage.roots {
            ready.extend(self.scheduler.handle_trigger(root));
        }

        if self.scheduler.is_idle() {
            // Nothing participated (e.g. every root unknown).
            self.stage_done();
        }

        if ready.is_empty() {
            Vec::new()
        } else {
            vec![CoreCommand::DispatchTasks(ready)]
        }
    }

    /// The scheduler went idle: report the stage to the sequencer.
    fn stage_done(&mut self) {
        if let Some(active) = self.active.as_mut() {
            let failures = mem::take(&mut active.stage_failures);
            active.next_stage = active.sequencer.stage_finished(failures);
        }
    }

    /// Retire the active run and emit its follow-up commands.
    fn finish_run(&mut self) -> Vec<CoreCommand> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };

        let mut commands = Vec::new();
        let label = active.request.target.label().to_string();

        let failure = match active.sequencer.state() {
            SequenceState::Done => {
                info!(run = %label, "run finished");
                if let Some(kind) = active.request.reload {
                    commands.push(CoreCommand::Reload(kind));
                }
                None
            }
            SequenceState::Failed { stage, tasks } => {
                warn!(run = %label, stage, tasks = ?tasks, "run failed");
                Some(RunFailure {
                    target: label,
                    stage: *stage,
                    tasks: tasks.clone(),
                })
            }
            other => {
                warn!(run = %label, state = ?other, "run retired before finishing");
                None
            }
        };

        if self.record_outcome(failure) {
            commands.push(CoreCommand::RequestExit);
        }

        commands
    }

    /// Returns `true` if the process should exit because of this outcome.
    fn record_outcome(&mut self, failure: Option<RunFailure>) -> bool {
        let initial = self.report.completed_runs == 0;
        self.report.completed_runs += 1;

        let Some(failure) = failure else {
            return false;
        };
        if initial {
            self.report.initial_failure = Some(failure);
            if self.options.exit_on_initial_failure {
                error!("initial run failed; exiting");
                return true;
            }
        } else {
            self.report.later_failures.push(failure);
        }
        false
    }
}
