// tests/plan_properties.rs

//! Any acyclic registry, any request, any set of failing tasks: the core
//! finishes the run, never dispatches a task twice, and never dispatches a
//! task before its prerequisites succeeded.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;

use assetdag::engine::{
    CoreCommand, CoreRuntime, RunRequest, RuntimeEvent, RuntimeOptions, TaskOutcome,
    TriggerWhileRunningBehaviour,
};
use assetdag::registry::TaskRegistry;
use assetdag::types::BuildMode;
use assetdag_test_utils::RegistryBuilder;

/// Task `i` may only depend on tasks `0..i`, so the graph is acyclic.
fn registry_strategy(max_tasks: usize) -> impl Strategy<Value = (TaskRegistry, Vec<Vec<usize>>)> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n).prop_map(
            move |raw| {
                let mut deps: Vec<Vec<usize>> = Vec::with_capacity(n);
                let mut builder = RegistryBuilder::new();
                for (i, potential) in raw.into_iter().enumerate() {
                    let mine: BTreeSet<usize> = if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    let names: Vec<String> = mine.iter().map(|d| format!("t{d}")).collect();
                    let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
                    builder = builder.task(&format!("t{i}"), &refs);
                    deps.push(mine.into_iter().collect());
                }

                let all: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
                let all_refs: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
                builder = builder.sequence("all", &[], &all_refs);
                (builder.build(), deps)
            },
        )
    })
}

proptest! {
    #[test]
    fn core_terminates_and_respects_prerequisites(
        (registry, deps) in registry_strategy(8),
        failing_idx in proptest::collection::vec(0..8usize, 0..3),
        use_sequence in any::<bool>(),
        root_idx in 0..8usize,
    ) {
        let n = deps.len();
        let failing: HashSet<String> = failing_idx
            .into_iter()
            .filter(|i| *i < n)
            .map(|i| format!("t{i}"))
            .collect();

        let request = if use_sequence {
            RunRequest::task("all", BuildMode::Development)
        } else {
            RunRequest::task(format!("t{}", root_idx % n), BuildMode::Development)
        };

        let mut core = CoreRuntime::new(
            Arc::new(registry),
            TriggerWhileRunningBehaviour::Queue,
            1,
            RuntimeOptions::default(),
        );

        let mut in_flight: VecDeque<String> = VecDeque::new();
        let mut succeeded: HashSet<String> = HashSet::new();
        let mut dispatched_this_stage: HashSet<String> = HashSet::new();
        let mut ran_failing_task = false;
        let mut steps = 0;

        let step = core.step(RuntimeEvent::RunRequested(request));
        collect_dispatched(&deps, step.commands, &mut in_flight, &succeeded, &mut dispatched_this_stage);

        while let Some(task) = in_flight.pop_front() {
            steps += 1;
            prop_assert!(steps < 1000, "runaway simulation");

            let outcome = if failing.contains(&task) {
                ran_failing_task = true;
                TaskOutcome::Failed(1)
            } else {
                succeeded.insert(task.clone());
                TaskOutcome::Success
            };
            let step = core.step(RuntimeEvent::TaskCompleted { task, outcome });

            // Nothing in flight means the stage ended; the next one may
            // re-run tasks of an earlier stage.
            if in_flight.is_empty() {
                dispatched_this_stage.clear();
            }
            collect_dispatched(&deps, step.commands, &mut in_flight, &succeeded, &mut dispatched_this_stage);
        }

        prop_assert!(core.is_idle());
        prop_assert_eq!(core.report().completed_runs, 1);
        prop_assert_eq!(core.report().succeeded(), !ran_failing_task);
    }
}

fn collect_dispatched(
    deps: &[Vec<usize>],
    commands: Vec<CoreCommand>,
    in_flight: &mut VecDeque<String>,
    succeeded: &HashSet<String>,
    dispatched: &mut HashSet<String>,
) {
    for command in commands {
        let CoreCommand::DispatchTasks(tasks) = command else {
            continue;
        };
        for task in tasks {
            let idx: usize = task.name[1..].parse().unwrap();
            for dep in &deps[idx] {
                assert!(
                    succeeded.contains(&format!("t{dep}")),
                    "{} dispatched before t{dep}",
                    task.name
                );
            }
            assert!(dispatched.insert(task.name.clone()), "{} dispatched twice", task.name);
            in_flight.push_back(task.name);
        }
    }
}
