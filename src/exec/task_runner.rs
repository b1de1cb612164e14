// src/exec/task_runner.rs

//! Runs the body of a single scheduled task.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::TransformError;
use crate::exec::ExecContext;
use crate::registry::{DeploySpec, ServeSpec, TaskBody};
use crate::server;
use crate::transform::sources::{relative_slash, walk_files};
use crate::transform::{SharedTransform, TransformContext};
use crate::watch::spawn_watcher;

/// Run `task` and report exactly one `TaskCompleted` for it.
///
/// Errors are logged here; the scheduler only sees the outcome.
pub async fn run_task(task: ScheduledTask, ctx: Arc<ExecContext>) {
    let name = task.name.clone();
    let run_id = task.run_id;

    let outcome = match execute(&task, &ctx).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %name, run_id, "task failed: {err:#}");
            TaskOutcome::Failed(-1)
        }
    };

    info!(task = %name, run_id, ?outcome, "task finished");

    if let Err(err) = ctx
        .runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: name.clone(),
            outcome,
        })
        .await
    {
        debug!(task = %name, error = %err, "runtime gone; dropping completion");
    }
}

async fn execute(task: &ScheduledTask, ctx: &ExecContext) -> Result<TaskOutcome> {
    let spec = ctx
        .registry
        .get(&task.name)
        .ok_or_else(|| anyhow!("unknown task '{}'", task.name))?;

    info!(task = %task.name, run_id = task.run_id, mode = %task.mode, "starting task");

    match &spec.body {
        TaskBody::Transforms(transforms) => run_transforms(task, ctx, transforms).await,
        TaskBody::External { command } => run_shell(command, &ctx.root).await,
        TaskBody::Serve(serve) => start_serve(task, ctx, serve).await,
        TaskBody::Deploy(deploy) => run_deploy(ctx, deploy).await,
        TaskBody::Sequence(_) => bail!(
            "sequence task '{}' reached the executor; sequences are expanded by the planner",
            task.name
        ),
    }
}

/// Run every transform on the blocking pool, concurrently. The task fails
/// if any transform fails; the others still finish.
async fn run_transforms(
    task: &ScheduledTask,
    ctx: &ExecContext,
    transforms: &[SharedTransform],
) -> Result<TaskOutcome> {
    let tctx = TransformContext::new(ctx.root.clone(), Arc::clone(&ctx.fs), task.mode);
    let mut set = JoinSet::new();

    for transform in transforms {
        let transform = Arc::clone(transform);
        let tctx = tctx.clone();
        set.spawn_blocking(move || {
            let result = transform.run(&tctx);
            (transform.name().to_string(), result)
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = set.join_next().await {
        let (name, result) = joined.context("transform panicked")?;
        match result {
            Ok(report) => {
                debug!(task = %task.name, transform = %name, outputs = ?report.outputs, "transform done");
            }
            Err(err) => {
                error!(task = %task.name, transform = %name, "{err}");
                failed += 1;
            }
        }
    }

    if failed == 0 {
        Ok(TaskOutcome::Success)
    } else {
        Ok(TaskOutcome::Failed(-1))
    }
}

/// Run `command` through the platform shell with inherited stdio.
async fn run_shell(command: &str, cwd: &Path) -> Result<TaskOutcome> {
    run_shell_with_args(command, &[], cwd).await
}

/// Like [`run_shell`], with `args` as the script's positional parameters
/// (`$1`, `$2`, ...), so they reach the command unsplit and unexpanded.
async fn run_shell_with_args(command: &str, args: &[&OsStr], cwd: &Path) -> Result<TaskOutcome> {
    info!(cmd = %command, "running external command");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command).arg("assetdag").args(args);
        c
    };

    let status = cmd
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
        .map_err(|e| TransformError::Process {
            cmd: command.to_string(),
            message: e.to_string(),
        })?;

    let code = status.code().unwrap_or(-1);
    info!(cmd = %command, exit_code = code, success = status.success(), "command exited");

    if status.success() {
        Ok(TaskOutcome::Success)
    } else {
        Ok(TaskOutcome::Failed(code))
    }
}

/// `{dir}` in a deploy command, rewritten for the platform shell.
///
/// `sh` receives the directory as `$1`; `cmd` has no positional
/// parameters, so the path is inlined in double quotes.
fn deploy_command(template: &str, dir: &Path) -> String {
    if cfg!(windows) {
        template.replace("{dir}", &format!("\"{}\"", dir.display()))
    } else {
        template.replace("{dir}", "\"$1\"")
    }
}

/// Bind the server, then start it and the watchers in the background.
///
/// The task succeeds once the socket is bound; the session lives until the
/// process exits.
async fn start_serve(
    task: &ScheduledTask,
    ctx: &ExecContext,
    serve: &ServeSpec,
) -> Result<TaskOutcome> {
    let listener = server::bind(&serve.host, serve.port).await?;
    let app = server::router(&ctx.root.join(&serve.root), ctx.hub.clone());

    let watcher = spawn_watcher(
        ctx.root.clone(),
        ctx.bindings.clone(),
        Arc::clone(&ctx.fs),
        ctx.runtime_tx.clone(),
        task.mode,
    )
    .context("starting file watcher")?;

    tokio::spawn(async move {
        let _watcher = watcher;
        if let Err(err) = server::run(listener, app).await {
            error!("dev server stopped: {err:#}");
        }
    });

    Ok(TaskOutcome::Success)
}

/// Copy the built site into a fresh staging directory and hand it to the
/// publisher command.
async fn run_deploy(ctx: &ExecContext, deploy: &DeploySpec) -> Result<TaskOutcome> {
    let site_dir = ctx.root.join(&deploy.site_dir);
    let staging_dir = ctx.root.join(&deploy.staging_dir);

    if !ctx.fs.is_dir(&site_dir) {
        bail!("site directory {:?} does not exist; build the site first", site_dir);
    }

    let fs = Arc::clone(&ctx.fs);
    let (from, to) = (site_dir.clone(), staging_dir.clone());
    let copied = tokio::task::spawn_blocking(move || -> Result<usize> {
        fs.remove_dir_all(&to)?;
        fs.create_dir_all(&to)?;
        let files = walk_files(fs.as_ref(), &from)?;
        for file in &files {
            let rel = relative_slash(&from, file)
                .ok_or_else(|| anyhow!("{:?} is outside {:?}", file, from))?;
            let bytes = fs.read(file)?;
            fs.write(&to.join(rel), &bytes)?;
        }
        Ok(files.len())
    })
    .await
    .context("staging task panicked")??;

    info!(files = copied, staging = ?staging_dir, "staged site for publishing");

    let command = deploy_command(&deploy.command, &staging_dir);
    run_shell_with_args(&command, &[staging_dir.as_os_str()], &ctx.root).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;
    use crate::registry::{TaskRegistry, TaskSpec};
    use crate::server::ReloadHub;
    use crate::types::BuildMode;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn exec_context(registry: TaskRegistry, fs: MockFileSystem) -> ExecContext {
        let (tx, _rx) = mpsc::channel(8);
        ExecContext {
            registry: Arc::new(registry),
            root: PathBuf::from("."),
            fs: Arc::new(fs),
            runtime_tx: tx,
            hub: ReloadHub::new(),
            bindings: Vec::new(),
        }
    }

    fn scheduled(name: &str) -> ScheduledTask {
        ScheduledTask {
            name: name.to_string(),
            run_id: 1,
            mode: BuildMode::Development,
        }
    }

    #[tokio::test]
    async fn deploy_without_site_dir_fails() {
        let deploy = DeploySpec {
            site_dir: "site".to_string(),
            staging_dir: ".publish".to_string(),
            command: "true {dir}".to_string(),
        };
        let mut registry = TaskRegistry::new();
        registry
            .register(TaskSpec::new("deploy", TaskBody::Deploy(deploy)))
            .unwrap();
        let ctx = exec_context(registry, MockFileSystem::new());

        assert!(execute(&scheduled("deploy"), &ctx).await.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn deploy_command_passes_dir_as_positional() {
        let command = deploy_command("publish --dir {dir}", Path::new("/tmp/my site/.publish"));
        assert_eq!(command, "publish --dir \"$1\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_exit_codes_and_spawn_errors() {
        let outcome = run_shell("exit 3", Path::new(".")).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Failed(3));

        let err = run_shell("true", Path::new("./no/such/dir")).await.unwrap_err();
        assert!(err.downcast_ref::<TransformError>().is_some());
    }

    #[tokio::test]
    async fn sequence_bodies_are_rejected() {
        let mut registry = TaskRegistry::new();
        registry
            .register(TaskSpec::new("a", TaskBody::Transforms(Vec::new())))
            .unwrap();
        registry
            .register(TaskSpec::new("seq", TaskBody::Sequence(vec!["a".to_string()])))
            .unwrap();
        let fs = MockFileSystem::new();
        let ctx = exec_context(registry, fs.clone());

        assert!(execute(&scheduled("seq"), &ctx).await.is_err());
        let outcome = execute(&scheduled("a"), &ctx).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Success);
        assert!(!fs.exists(Path::new("./build")));
    }
}
