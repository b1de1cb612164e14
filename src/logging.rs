// src/logging.rs

//! `tracing` subscriber for the CLI, written to stderr.
//!
//! `--log-level` wins over `ASSETDAG_LOG`, which accepts full `EnvFilter`
//! directives (`assetdag=debug,tower_http=info`). Without either, the level
//! is `info` with the HTTP and watcher crates held at `warn`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETDAG_LOG";

const QUIET_DEPENDENCIES: &str = "tower_http=warn,hyper=warn,notify=warn";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = filter_directives(cli_level, std::env::var(LOG_ENV).ok().as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter `{directives}`"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialised: {e}"))
}

fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return format!("{},{QUIET_DEPENDENCIES}", level_name(level));
    }
    match env.map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => format!("info,{QUIET_DEPENDENCIES}"),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
