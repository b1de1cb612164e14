// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::types::BuildMode;
use crate::watch::bindings::WatchBinding;
use crate::watch::event_handler::{WatchContext, process_changes};
use crate::watch::hash::{FileCache, HashStore, MemoryHashStore};

/// Events arriving within this window are handled as one batch.
const BATCH_WINDOW: Duration = Duration::from_millis(50);

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops
/// file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send a `RuntimeEvent::RunRequested` for
/// every binding that a change fires.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mode: BuildMode,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watcher loop gone; dropping notify event");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = ?root, bindings = bindings.len(), "file watcher started");

    let hash_store: Box<dyn HashStore> = Box::new(MemoryHashStore::new());
    let ctx = WatchContext {
        fs,
        root,
        bindings: Arc::new(bindings),
        runtime_tx,
        mode,
        hash_store: Arc::new(Mutex::new(hash_store)),
        file_cache: Arc::new(Mutex::new(FileCache::new())),
    };

    tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut paths = Vec::new();
            collect_paths(first, &mut paths);

            while let Ok(Some(event)) = tokio::time::timeout(BATCH_WINDOW, event_rx.recv()).await {
                collect_paths(event, &mut paths);
            }

            if paths.is_empty() {
                continue;
            }
            paths.sort();
            paths.dedup();
            debug!(?paths, "processing change batch");

            if !process_changes(&ctx, &paths).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Keep the paths of content-changing events only.
fn collect_paths(event: Event, out: &mut Vec<PathBuf>) {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
            out.extend(event.paths);
        }
        _ => {}
    }
}
