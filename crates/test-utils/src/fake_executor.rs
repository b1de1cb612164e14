use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetdag::dag::ScheduledTask;
use assetdag::engine::{RuntimeEvent, TaskOutcome};
use assetdag::errors::{AssetdagError, Result};
use assetdag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records every scheduled task (with its run id and mode)
/// - immediately reports `TaskCompleted`, failing the configured names.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledTask>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            executed: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
        }
    }

    /// Report these tasks as failed with exit code 1.
    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Shared log of executed tasks, readable after the runtime finished.
    pub fn log(&self) -> Arc<Mutex<Vec<ScheduledTask>>> {
        Arc::clone(&self.executed)
    }
}

/// Names from an execution log, in dispatch order.
pub fn executed_names(log: &Arc<Mutex<Vec<ScheduledTask>>>) -> Vec<String> {
    log.lock().unwrap().iter().map(|t| t.name.clone()).collect()
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                executed.lock().unwrap().push(t.clone());

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed(1)
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                })
                .await
                .map_err(|e| AssetdagError::Other(anyhow::anyhow!("{e}")))?;
            }
            Ok(())
        })
    }
}
