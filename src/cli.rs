// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build, watch and serve static-site assets from a task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (`serve`, `build`, `deploy`, `default`, or any single task).
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Produce minified output without source maps.
    ///
    /// `build` always runs in production mode regardless of this flag.
    #[arg(long)]
    pub production: bool,

    /// Path to the config file (TOML).
    ///
    /// A missing file at the default location means "use built-in defaults";
    /// any other missing path is an error.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the task registry and the plan for TASK without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
