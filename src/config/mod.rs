// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate paths, globs, browser queries and queue settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_cli_config, load_from_path,
    load_or_default,
};
pub use model::{
    ConfigFile, ConfigSection, DeploySection, PathsSection, RawConfigFile, ServerSection,
    SiteSection, StylesSection, WatchConfig,
};
pub use validate::validate_config;
