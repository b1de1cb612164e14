// tests/watch_bindings.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetdag::config::{ConfigFile, RawConfigFile};
use assetdag::engine::{
    CoreRuntime, RunTarget, Runtime, RuntimeEvent, RuntimeOptions, TriggerWhileRunningBehaviour,
};
use assetdag::fs::mock::MockFileSystem;
use assetdag::registry::TaskRegistry;
use assetdag::server::ReloadHub;
use assetdag::types::{BuildMode, ReloadKind};
use assetdag::watch::event_handler::{WatchContext, matching_bindings, process_changes};
use assetdag::watch::{FileCache, HashStore, MemoryHashStore, build_bindings};
use assetdag_test_utils::fake_executor::executed_names;
use assetdag_test_utils::{FakeExecutor, init_tracing, with_timeout};

fn default_config() -> ConfigFile {
    ConfigFile::try_from(RawConfigFile::default()).unwrap()
}

/// Feed `paths` through the watch handler and collect the resulting events.
async fn requests_for(paths: &[&str]) -> Vec<RuntimeEvent> {
    let cfg = default_config();
    let (tx, mut rx) = mpsc::channel(16);
    let hash_store: Box<dyn HashStore> = Box::new(MemoryHashStore::new());
    let ctx = WatchContext {
        fs: Arc::new(MockFileSystem::new()),
        root: PathBuf::from("."),
        bindings: Arc::new(build_bindings(&cfg.watch).unwrap()),
        runtime_tx: tx,
        mode: BuildMode::Development,
        hash_store: Arc::new(Mutex::new(hash_store)),
        file_cache: Arc::new(Mutex::new(FileCache::new())),
    };

    let paths: Vec<PathBuf> = paths.iter().map(|p| PathBuf::from(".").join(p)).collect();
    assert!(process_changes(&ctx, &paths).await);
    drop(ctx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn image_change_only_runs_the_image_task() {
    init_tracing();

    let events = requests_for(&["assets/img/photos/cat.jpg"]).await;
    assert_eq!(events.len(), 1);

    let RuntimeEvent::RunRequested(request) = events[0].clone() else {
        panic!("expected a run request, got {:?}", events[0]);
    };
    assert_eq!(
        request.target,
        RunTarget::Sequence {
            label: "images".to_string(),
            steps: vec!["img".to_string()],
        }
    );
    assert_eq!(request.reload, Some(ReloadKind::Full));

    // Through the runtime, the image binding never reaches styles or scripts.
    let cfg = default_config();
    let registry = TaskRegistry::standard(&cfg).unwrap();
    let (rt_tx, rt_rx) = mpsc::channel(16);
    let executor = FakeExecutor::new(rt_tx.clone());
    let log = executor.log();
    rt_tx.send(RuntimeEvent::RunRequested(request)).await.unwrap();

    let core = CoreRuntime::new(
        Arc::new(registry),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
            exit_on_initial_failure: false,
        },
    );
    let hub = ReloadHub::new();
    let mut reloads = hub.subscribe();
    let report = with_timeout(3, Runtime::new(core, rt_rx, executor, hub).run())
        .await
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(executed_names(&log), vec!["img"]);
    assert_eq!(
        reloads.try_recv().unwrap(),
        assetdag::server::ReloadMessage::Reload
    );
}

#[tokio::test]
async fn style_and_script_changes_fire_their_bindings_once() {
    init_tracing();

    let events = requests_for(&[
        "assets/sass/main.scss",
        "assets/sass/partials/_grid.scss",
        "assets/js/app.js",
        "README.md",
    ])
    .await;

    let labels: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            RuntimeEvent::RunRequested(r) => Some(r.target.label().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["scripts", "styles"]);
}

#[test]
fn output_tree_changes_fire_nothing() {
    let cfg = default_config();
    let bindings = build_bindings(&cfg.watch).unwrap();
    let root = PathBuf::from("/project");
    let paths = vec![
        root.join("build/css/main.css"),
        root.join("build/js/main.min.js"),
        PathBuf::from("/elsewhere/assets/img/a.png"),
    ];

    assert!(matching_bindings(&root, &paths, &bindings).is_empty());
}
