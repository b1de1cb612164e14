// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod server;
pub mod transform;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_cli_config;
use crate::config::model::ConfigFile;
use crate::dag::plan_for_task;
use crate::engine::{CoreRuntime, RunReport, RunRequest, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::AssetdagError;
use crate::exec::{ExecContext, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::{TaskBody, TaskRegistry};
use crate::server::ReloadHub;
use crate::types::BuildMode;
use crate::watch::build_bindings;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the task registry
/// - scheduler / sequencer / queue / runtime
/// - executor (and, for `serve`, the dev server and watchers)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_cli_config(&args.config)?;
    let registry = TaskRegistry::standard(&cfg)?;
    let spec = registry.require(&args.task)?;
    let is_serve = matches!(spec.body, TaskBody::Serve(_));

    if args.dry_run {
        print_dry_run(&cfg, &registry, &args.task)?;
        return Ok(());
    }

    let mode = BuildMode::from_flag(args.production);
    let report = execute_task(&cfg, registry, &args.task, mode, Arc::new(RealFileSystem)).await?;

    // A serve session stopped with Ctrl-C only fails if its startup run did.
    let failure = if is_serve {
        report.initial_failure.as_ref()
    } else {
        report
            .initial_failure
            .as_ref()
            .or_else(|| report.later_failures.first())
    };

    match failure {
        Some(failure) => Err(AssetdagError::TaskFailed(failure.to_string()).into()),
        None => {
            info!(task = %args.task, "done");
            Ok(())
        }
    }
}

/// Run `task` from `registry` until its plan completes, or, for `serve`,
/// until shutdown.
pub async fn execute_task(
    cfg: &ConfigFile,
    registry: TaskRegistry,
    task: &str,
    mode: BuildMode,
    fs: Arc<dyn FileSystem>,
) -> errors::Result<RunReport> {
    let spec = registry.require(task)?;
    let options = if matches!(spec.body, TaskBody::Serve(_)) {
        RuntimeOptions {
            exit_when_idle: false,
            exit_on_initial_failure: true,
        }
    } else {
        RuntimeOptions {
            exit_when_idle: true,
            exit_on_initial_failure: false,
        }
    };

    let registry = Arc::new(registry);
    let bindings = build_bindings(&cfg.watch)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let hub = ReloadHub::new();

    let executor = RealExecutorBackend::new(ExecContext {
        registry: Arc::clone(&registry),
        root: cfg.root.clone(),
        fs,
        runtime_tx: rt_tx.clone(),
        hub: hub.clone(),
        bindings,
    });

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(task = %task, %mode, root = ?cfg.root, "starting");
    rt_tx
        .send(RuntimeEvent::RunRequested(RunRequest::task(task, mode)))
        .await
        .map_err(|e| AssetdagError::Other(anyhow::anyhow!("runtime channel closed: {e}")))?;

    let core = CoreRuntime::new(
        registry,
        cfg.config.triggered_while_running_behaviour,
        cfg.config.queue_length,
        options,
    );

    let runtime = Runtime::new(core, rt_rx, executor, hub);
    runtime.run().await
}

/// Print tasks, prerequisites, bodies and the plan for `task`.
fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry, task: &str) -> errors::Result<()> {
    println!("assetdag dry-run");
    println!("  root = {}", cfg.root.display());
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!();

    println!("tasks ({}):", registry.len());
    for spec in registry.iter() {
        println!("  - {}: {}", spec.name, spec.description);
        if !spec.prerequisites.is_empty() {
            println!("      after: {:?}", spec.prerequisites);
        }
        if let Some(mode) = spec.forced_mode {
            println!("      mode: {mode}");
        }
        println!("      body: {}", spec.body.summary());
    }
    println!();

    println!("watch bindings ({}):", cfg.watch.len());
    for (name, binding) in &cfg.watch {
        println!(
            "  - {name}: {:?} -> [{}] (reload: {:?})",
            binding.patterns,
            binding.run.join(", "),
            binding.reload
        );
    }
    println!();

    let plan = plan_for_task(registry, task)?;
    println!("plan for '{task}':");
    print!("{plan}");

    debug!("dry-run complete (no execution)");
    Ok(())
}
