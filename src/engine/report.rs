// src/engine/report.rs

use std::fmt;

use crate::engine::TaskName;

/// A run that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Label of the run target (task or binding name).
    pub target: String,
    /// 0-based index of the stage that failed.
    pub stage: usize,
    pub tasks: Vec<TaskName>,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' failed at stage {} ({})",
            self.target,
            self.stage + 1,
            self.tasks.join(", ")
        )
    }
}

/// Summary of everything the runtime executed.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub completed_runs: usize,
    /// Outcome of the first run: `None` if it succeeded or never finished.
    pub initial_failure: Option<RunFailure>,
    /// Failures of every later run.
    pub later_failures: Vec<RunFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.initial_failure.is_none() && self.later_failures.is_empty()
    }
}
