// src/exec/executor_loop.rs

//! Main executor loop that manages running task bodies.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::exec::ExecContext;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task. Per task name there is
/// never more than one body running: a task dispatched while its previous
/// instance is still running waits for it first.
pub fn spawn_executor(ctx: Arc<ExecContext>) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &mut active, &ctx).await;
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<String, JoinHandle<()>>,
    ctx: &Arc<ExecContext>,
) {
    let name = task.name.clone();

    if let Some(previous) = active.remove(&name) {
        if !previous.is_finished() {
            warn!(
                task = %name,
                run_id = task.run_id,
                "previous instance still running; waiting for it"
            );
            if let Err(err) = previous.await {
                warn!(task = %name, error = %err, "previous instance panicked");
            }
        }
    }

    let ctx = Arc::clone(ctx);
    let spawn_name = name.clone();
    let handle = tokio::spawn(async move {
        run_task(task, ctx).await;
        debug!(task = %spawn_name, "task runner future finished");
    });

    active.insert(name, handle);
}
