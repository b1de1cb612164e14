// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs the bodies of scheduled tasks and reports back to the
//! orchestration runtime via `RuntimeEvent::TaskCompleted`.
//!
//! - [`executor_loop`] owns the background loop receiving scheduled tasks.
//! - [`task_runner`] executes one task body (transforms, shell commands,
//!   the dev server, deploy).
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the runtime uses in production, and which tests
//!   replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::registry::TaskRegistry;
use crate::server::ReloadHub;
use crate::watch::WatchBinding;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;

/// Shared, read-only state every task runner needs.
pub struct ExecContext {
    pub registry: Arc<TaskRegistry>,
    /// Project root; task paths are relative to it.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
    /// Live-reload hub handed to the dev server.
    pub hub: ReloadHub,
    /// Watch bindings started by the `serve` body.
    pub bindings: Vec<WatchBinding>,
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("root", &self.root)
            .field("tasks", &self.registry.len())
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}
