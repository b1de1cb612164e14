// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::server::ReloadHub;

use super::core::CoreRuntime;
use super::report::RunReport;
use super::{CoreCommand, RuntimeEvent};

/// Drives the core state machine in response to `RuntimeEvent`s and
/// delegates task execution to an `ExecutorBackend`.
///
/// All run semantics live in `CoreRuntime`; this struct only does the async
/// IO: reading events, dispatching tasks and forwarding reloads.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reload: ReloadHub,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        reload: ReloadHub,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reload,
        }
    }

    /// Main event loop.
    ///
    /// Returns the report of every run once the core asks to stop, shutdown
    /// is requested, or the event channel closes.
    pub async fn run(mut self) -> Result<RunReport> {
        debug!("runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime");
                break;
            }
        }

        Ok(self.core.report().clone())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::Reload(kind) => {
                self.reload.notify(kind);
            }
            CoreCommand::RequestExit => {
                // keep_running is already false for this step.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, run_id = tasks[0].run_id, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
