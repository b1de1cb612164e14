// src/watch/event_handler.rs

//! Turns a batch of changed paths into run requests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RunRequest, RuntimeEvent};
use crate::fs::FileSystem;
use crate::transform::sources::relative_slash;
use crate::types::BuildMode;
use crate::watch::bindings::{WatchBinding, collect_matching_files};
use crate::watch::hash::{FileCache, HashStore, compute_aggregate_hash};

/// Everything the watcher loop needs to evaluate a change.
pub struct WatchContext {
    pub fs: Arc<dyn FileSystem>,
    pub root: PathBuf,
    pub bindings: Arc<Vec<WatchBinding>>,
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
    pub mode: BuildMode,
    pub hash_store: Arc<Mutex<Box<dyn HashStore>>>,
    pub file_cache: Arc<Mutex<FileCache>>,
}

impl std::fmt::Debug for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchContext")
            .field("root", &self.root)
            .field("bindings", &self.bindings)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Relativize `path` against `root`, retrying with the canonical form of
/// `path` (notify may report paths through symlinks).
pub fn relative_event_path(root: &Path, path: &Path) -> Option<String> {
    if let Some(rel) = relative_slash(root, path) {
        return Some(rel);
    }
    let canonical = path.canonicalize().ok()?;
    relative_slash(root, &canonical)
}

/// Indices of the bindings fired by any of `paths`, in binding order.
///
/// Each binding fires at most once per batch.
pub fn matching_bindings(
    root: &Path,
    paths: &[PathBuf],
    bindings: &[WatchBinding],
) -> BTreeSet<usize> {
    let mut fired = BTreeSet::new();

    for path in paths {
        let Some(rel) = relative_event_path(root, path) else {
            debug!(?path, ?root, "event path outside project root; ignoring");
            continue;
        };

        for (idx, binding) in bindings.iter().enumerate() {
            if binding.matches(&rel) {
                debug!(binding = %binding.name(), path = %rel, "watch match");
                fired.insert(idx);
            }
        }
    }

    fired
}

/// Process one batch of filesystem changes.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_changes(ctx: &WatchContext, paths: &[PathBuf]) -> bool {
    {
        let mut cache = ctx
            .file_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for path in paths {
            cache.invalidate(path);
        }
    }

    let fired = matching_bindings(&ctx.root, paths, &ctx.bindings);

    for idx in fired {
        let binding = &ctx.bindings[idx];
        if !should_trigger(ctx, binding).await {
            continue;
        }

        info!(binding = %binding.name(), steps = ?binding.steps(), "change detected");
        let request = RunRequest::sequence(
            binding.name(),
            binding.steps().to_vec(),
            ctx.mode,
            Some(binding.reload()),
        );

        if let Err(err) = ctx.runtime_tx.send(RuntimeEvent::RunRequested(request)).await {
            warn!("failed to send RuntimeEvent::RunRequested: {err}");
            return false;
        }
    }

    true
}

/// Hash gate for `use_hash` bindings: only fire when the aggregated
/// content of every matched file changed since the last fire.
async fn should_trigger(ctx: &WatchContext, binding: &WatchBinding) -> bool {
    if !binding.use_hash() {
        return true;
    }

    let fs = Arc::clone(&ctx.fs);
    let root = ctx.root.clone();
    let binding = binding.clone();
    let hash_store = Arc::clone(&ctx.hash_store);
    let file_cache = Arc::clone(&ctx.file_cache);

    tokio::task::spawn_blocking(move || {
        let name = binding.name().to_string();
        let files = match collect_matching_files(fs.as_ref(), &root, &binding) {
            Ok(files) => files,
            Err(err) => {
                warn!(binding = %name, error = %err, "failed to collect watched files; triggering anyway");
                return true;
            }
        };

        let mut hashes = Vec::with_capacity(files.len());
        {
            let mut cache = file_cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for file in &files {
                match cache.get_or_compute(fs.as_ref(), file) {
                    Ok(h) => hashes.push(h),
                    Err(err) => {
                        warn!(binding = %name, file = ?file, error = %err, "failed to hash file; triggering anyway");
                        return true;
                    }
                }
            }
        }

        let new_hash = compute_aggregate_hash(&hashes);
        let mut store = hash_store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if store.load(&name).as_deref() == Some(new_hash.as_str()) {
            info!(binding = %name, "watched content unchanged; skipping");
            return false;
        }
        store.save(&name, &new_hash);
        true
    })
    .await
    .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::fs::mock::MockFileSystem;
    use crate::types::ReloadKind;
    use crate::watch::hash::MemoryHashStore;

    fn context(
        fs: MockFileSystem,
        bindings: Vec<WatchBinding>,
    ) -> (WatchContext, mpsc::Receiver<RuntimeEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let ctx = WatchContext {
            fs: Arc::new(fs),
            root: PathBuf::from("."),
            bindings: Arc::new(bindings),
            runtime_tx: tx,
            mode: BuildMode::Development,
            hash_store: Arc::new(Mutex::new(Box::new(MemoryHashStore::new()))),
            file_cache: Arc::new(Mutex::new(FileCache::new())),
        };
        (ctx, rx)
    }

    fn binding(name: &str, pattern: &str, run: &[&str], use_hash: bool) -> WatchBinding {
        let mut cfg = WatchConfig::new(&[pattern], run, ReloadKind::Full);
        cfg.use_hash = use_hash;
        WatchBinding::compile(name, &cfg).unwrap()
    }

    #[tokio::test]
    async fn one_request_per_binding_per_batch() {
        let (ctx, mut rx) = context(
            MockFileSystem::new(),
            vec![
                binding("images", "assets/img/**/*", &["img"], false),
                binding("scripts", "assets/js/**/*.js", &["vendors", "scripts"], false),
            ],
        );

        let paths = vec![
            PathBuf::from("./assets/img/a.png"),
            PathBuf::from("./assets/img/b.png"),
        ];
        assert!(process_changes(&ctx, &paths).await);
        drop(ctx);

        let mut requests = Vec::new();
        while let Some(RuntimeEvent::RunRequested(req)) = rx.recv().await {
            requests.push(req);
        }
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target.label(), "images");
        assert_eq!(requests[0].reload, Some(ReloadKind::Full));
    }

    #[tokio::test]
    async fn hash_gate_skips_unchanged_content() {
        let fs = MockFileSystem::new();
        fs.add_file("./assets/a.txt", "one");
        let (ctx, mut rx) = context(
            fs.clone(),
            vec![binding("b", "assets/*.txt", &["t"], true)],
        );
        let paths = vec![PathBuf::from("./assets/a.txt")];

        process_changes(&ctx, &paths).await;
        process_changes(&ctx, &paths).await;
        fs.add_file("./assets/a.txt", "two");
        process_changes(&ctx, &paths).await;
        drop(ctx);

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
