// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::engine::RunRequest;
use crate::types::TriggerWhileRunningBehaviour;

/// Run requests that arrive while a run is already executing.
///
/// - `Queue`: append, merging a request identical to one already pending.
///   Once `max_runs` entries are pending, further requests are folded into
///   the last one, so no trigger is lost.
/// - `Drop`: ignore the request.
/// - `Latest`: keep only this request.
///
/// Pending requests are started one at a time, oldest first, once the
/// current run finishes.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<RunRequest>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Remember `request` for a later run, according to the behaviour.
    pub fn record_trigger(&mut self, request: RunRequest) {
        let label = request.target.label().to_string();

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if self.runs.contains(&request) {
                    debug!(run = %label, "merged request into identical queued run");
                    return;
                }
                if self.runs.len() < self.max_runs {
                    self.runs.push_back(request);
                    debug!(run = %label, queued = self.runs.len(), "queued run request");
                    return;
                }
                if let Some(last) = self.runs.back_mut() {
                    last.absorb(request);
                    debug!(
                        run = %label,
                        into = %last.target,
                        max_runs = self.max_runs,
                        "queue full; merged request into last queued run"
                    );
                }
            }
            TriggerWhileRunningBehaviour::Drop => {
                debug!(run = %label, "run in progress; dropping request");
            }
            TriggerWhileRunningBehaviour::Latest => {
                debug!(run = %label, "keeping only the latest request");
                self.runs.clear();
                self.runs.push_back(request);
            }
        }
    }

    /// Take the next pending request, if any.
    pub fn next_pending(&mut self) -> Option<RunRequest> {
        self.runs.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuildMode, ReloadKind};

    fn req(name: &str) -> RunRequest {
        RunRequest::task(name, BuildMode::Development)
    }

    fn watch(label: &str, steps: &[&str], reload: ReloadKind) -> RunRequest {
        RunRequest::sequence(
            label,
            steps.iter().map(|s| s.to_string()).collect(),
            BuildMode::Development,
            Some(reload),
        )
    }

    #[test]
    fn queue_merges_identical_and_folds_overflow_into_last() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 2);
        q.record_trigger(req("a"));
        q.record_trigger(req("a"));
        assert_eq!(q.len(), 1);
        q.record_trigger(req("b"));
        q.record_trigger(req("c"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.next_pending(), Some(req("a")));

        let merged = q.next_pending().expect("merged run");
        assert_eq!(merged.target.steps(), vec!["b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn full_queue_keeps_every_binding_and_the_covering_reload() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue, 1);
        q.record_trigger(watch("scripts", &["vendors", "scripts"], ReloadKind::Full));
        q.record_trigger(watch("styles", &["vendors", "styles"], ReloadKind::Styles));
        q.record_trigger(watch("styles", &["vendors", "styles"], ReloadKind::Styles));

        let merged = q.next_pending().expect("merged run");
        assert_eq!(merged.target.steps(), vec!["vendors", "scripts", "styles"]);
        assert_eq!(merged.target.label(), "scripts+styles");
        assert_eq!(merged.reload, Some(ReloadKind::Full));
        assert!(q.is_empty());
    }

    #[test]
    fn drop_ignores_and_latest_replaces() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Drop, 4);
        q.record_trigger(req("a"));
        assert!(q.is_empty());

        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Latest, 4);
        q.record_trigger(req("a"));
        q.record_trigger(req("b"));
        assert_eq!(q.next_pending(), Some(req("b")));
        assert!(q.is_empty());
    }
}
