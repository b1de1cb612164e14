// src/dag/sequencer.rs

//! Strictly ordered walk over the stages of an [`ExecutionPlan`].

use tracing::{debug, warn};

use crate::dag::plan::{ExecutionPlan, Stage};
use crate::engine::TaskName;

/// Where a sequence currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceState {
    /// Not started yet.
    Pending,
    /// Stage `i` has been submitted and has not finished.
    Running(usize),
    /// Stage `stage` finished with failed tasks; later stages never run.
    Failed { stage: usize, tasks: Vec<TaskName> },
    /// Every stage finished successfully.
    Done,
}

/// Each stage completes before the next is handed out; the first failing
/// stage halts the sequence.
#[derive(Debug, Clone)]
pub struct Sequencer {
    plan: ExecutionPlan,
    state: SequenceState,
}

impl Sequencer {
    pub fn new(plan: ExecutionPlan) -> Self {
        Self {
            plan,
            state: SequenceState::Pending,
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            SequenceState::Done | SequenceState::Failed { .. }
        )
    }

    /// `Pending -> Running(0)`, or straight to `Done` for an empty plan.
    ///
    /// Returns the stage to submit.
    pub fn start(&mut self) -> Option<Stage> {
        if self.state != SequenceState::Pending {
            warn!(state = ?self.state, "sequencer: start called twice; ignoring");
            return None;
        }
        self.enter(0)
    }

    /// Report that the running stage finished. `failed` lists the tasks of
    /// that stage that did not succeed.
    ///
    /// Returns the next stage to submit, if any.
    pub fn stage_finished(&mut self, failed: Vec<TaskName>) -> Option<Stage> {
        let SequenceState::Running(i) = self.state else {
            warn!(state = ?self.state, "sequencer: stage finished while not running; ignoring");
            return None;
        };

        if !failed.is_empty() {
            warn!(stage = i, tasks = ?failed, "sequencer: stage failed; halting");
            self.state = SequenceState::Failed {
                stage: i,
                tasks: failed,
            };
            return None;
        }

        self.enter(i + 1)
    }

    fn enter(&mut self, index: usize) -> Option<Stage> {
        match self.plan.stages.get(index) {
            Some(stage) => {
                debug!(stage = index, roots = ?stage.roots, "sequencer: entering stage");
                self.state = SequenceState::Running(index);
                Some(stage.clone())
            }
            None => {
                debug!("sequencer: all stages done");
                self.state = SequenceState::Done;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(stages: &[&[&str]]) -> ExecutionPlan {
        ExecutionPlan {
            stages: stages
                .iter()
                .map(|roots| Stage {
                    roots: roots.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn walks_stages_in_order() {
        let mut seq = Sequencer::new(plan(&[&["a"], &["b"]]));
        assert_eq!(seq.start().unwrap().roots, vec!["a"]);
        assert_eq!(seq.stage_finished(vec![]).unwrap().roots, vec!["b"]);
        assert!(seq.stage_finished(vec![]).is_none());
        assert_eq!(seq.state(), &SequenceState::Done);
    }

    #[test]
    fn failure_halts() {
        let mut seq = Sequencer::new(plan(&[&["a"], &["b"], &["c"]]));
        seq.start();
        seq.stage_finished(vec![]);
        assert!(seq.stage_finished(vec!["b".to_string()]).is_none());
        assert_eq!(
            seq.state(),
            &SequenceState::Failed {
                stage: 1,
                tasks: vec!["b".to_string()]
            }
        );
        assert!(seq.stage_finished(vec![]).is_none());
    }

    #[test]
    fn empty_plan_is_done_immediately() {
        let mut seq = Sequencer::new(ExecutionPlan::default());
        assert!(seq.start().is_none());
        assert!(seq.is_finished());
    }
}
