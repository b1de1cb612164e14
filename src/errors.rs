// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// One or more tasks of the requested plan failed.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single asset transform.
///
/// These never escape a task: the executor logs them and reports the task
/// as failed to the scheduler.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("CSS error in {path}: {message}")]
    Css { path: String, message: String },

    #[error("SCSS compile error in {path}: {message}")]
    Scss { path: String, message: String },

    #[error("JS error in {path}: {message}")]
    Js { path: String, message: String },

    #[error("command `{cmd}` failed: {message}")]
    Process { cmd: String, message: String },
}

impl TransformError {
    pub fn io(path: impl std::fmt::Debug, source: impl Into<anyhow::Error>) -> Self {
        TransformError::Io {
            path: format!("{:?}", path),
            source: source.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetdagError>;
