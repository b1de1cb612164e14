// tests/sequence_runtime.rs

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;

use assetdag::engine::{
    CoreRuntime, RunReport, RunRequest, Runtime, RuntimeEvent, RuntimeOptions,
    TriggerWhileRunningBehaviour,
};
use assetdag::registry::TaskRegistry;
use assetdag::server::ReloadHub;
use assetdag::types::BuildMode;
use assetdag_test_utils::fake_executor::executed_names;
use assetdag_test_utils::{FakeExecutor, RegistryBuilder, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn one_shot() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
        exit_on_initial_failure: false,
    }
}

/// Run `request` through the real runtime loop with a fake executor.
async fn run_with_fake(
    registry: TaskRegistry,
    request: RunRequest,
    failing: &[&str],
) -> Result<(RunReport, Vec<assetdag::dag::ScheduledTask>), Box<dyn Error>> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = FakeExecutor::new(rt_tx.clone()).failing(failing);
    let log = executor.log();

    rt_tx.send(RuntimeEvent::RunRequested(request)).await?;

    let core = CoreRuntime::new(
        Arc::new(registry),
        TriggerWhileRunningBehaviour::Queue,
        1,
        one_shot(),
    );
    let runtime = Runtime::new(core, rt_rx, executor, ReloadHub::new());
    let report = with_timeout(3, runtime.run()).await?;

    let executed = log.lock().unwrap().clone();
    Ok((report, executed))
}

#[tokio::test]
async fn failing_step_halts_remaining_stages() -> TestResult {
    init_tracing();

    let registry = RegistryBuilder::new()
        .task("a", &[])
        .task("b", &[])
        .task("c", &[])
        .sequence("all", &[], &["a", "b", "c"])
        .build();

    let (report, executed) =
        run_with_fake(registry, RunRequest::task("all", BuildMode::Development), &["b"]).await?;

    let names: Vec<&str> = executed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let failure = report.initial_failure.expect("run should have failed");
    assert_eq!(failure.target, "all");
    assert_eq!(failure.stage, 1);
    assert_eq!(failure.tasks, vec!["b".to_string()]);
    Ok(())
}

#[tokio::test]
async fn sequence_prerequisites_run_first_and_steps_in_order() -> TestResult {
    init_tracing();

    let registry = RegistryBuilder::new()
        .task("clean", &[])
        .task("vendors", &[])
        .task("styles", &[])
        .task("scripts", &[])
        .sequence("default", &["clean"], &["vendors", "styles", "scripts"])
        .build();

    let (report, executed) =
        run_with_fake(registry, RunRequest::task("default", BuildMode::Development), &[]).await?;

    let names: Vec<&str> = executed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["clean", "vendors", "styles", "scripts"]);
    assert!(report.succeeded());
    assert_eq!(report.completed_runs, 1);
    Ok(())
}

#[tokio::test]
async fn forced_production_wins_over_requested_mode() -> TestResult {
    init_tracing();

    let registry = RegistryBuilder::new()
        .task("clean", &[])
        .task("styles", &[])
        .task("scripts", &[])
        .sequence("build", &["clean"], &["styles", "scripts"])
        .forcing(BuildMode::Production)
        .build();

    let (report, executed) =
        run_with_fake(registry, RunRequest::task("build", BuildMode::Development), &[]).await?;

    assert!(report.succeeded());
    assert_eq!(executed.len(), 3);
    assert!(executed.iter().all(|t| t.mode == BuildMode::Production));
    Ok(())
}

#[tokio::test]
async fn failed_prerequisite_skips_dependents() -> TestResult {
    init_tracing();

    let registry = RegistryBuilder::new()
        .task("styles", &[])
        .task("scripts", &[])
        .task("serve-ish", &["styles", "scripts"])
        .build();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = FakeExecutor::new(rt_tx.clone()).failing(&["styles"]);
    let log = executor.log();
    rt_tx
        .send(RuntimeEvent::RunRequested(RunRequest::task(
            "serve-ish",
            BuildMode::Development,
        )))
        .await?;

    let core = CoreRuntime::new(
        Arc::new(registry),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: false,
            exit_on_initial_failure: true,
        },
    );
    let runtime = Runtime::new(core, rt_rx, executor, ReloadHub::new());
    let report = with_timeout(3, runtime.run()).await?;

    let mut names = executed_names(&log);
    names.sort();
    assert_eq!(names, vec!["scripts", "styles"]);

    let failure = report.initial_failure.expect("startup should have failed");
    assert!(failure.tasks.contains(&"styles".to_string()));
    assert!(failure.tasks.contains(&"serve-ish".to_string()));
    Ok(())
}
