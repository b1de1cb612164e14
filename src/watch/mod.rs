// src/watch/mod.rs

//! File watching and change detection for `serve`.
//!
//! This module is responsible for:
//! - Compiling the `[watch.<name>]` bindings into glob sets.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optional content hashing so a binding only fires when its files
//!   actually changed.
//!
//! It does **not** know about the task graph; it only turns filesystem
//! changes into run requests.

pub mod bindings;
pub mod event_handler;
pub mod hash;
pub mod watcher;

pub use bindings::{WatchBinding, build_bindings, collect_matching_files};
pub use hash::{FileCache, HashStore, MemoryHashStore};
pub use watcher::{WatcherHandle, spawn_watcher};
