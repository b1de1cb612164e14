// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, validate it, and root it at the
/// file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_root(config_root_dir(path)))
}

/// Like [`load_and_validate`], but a missing file yields the built-in
/// defaults rooted at the file's would-be directory.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        return load_and_validate(path);
    }

    debug!(?path, "no config file found; using built-in defaults");
    let config = ConfigFile::try_from(RawConfigFile::default())?;
    Ok(config.with_root(config_root_dir(path)))
}

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Assetdag.toml";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load the config named on the command line.
///
/// Only the default location may be absent; an explicit path that does not
/// exist is an error.
pub fn load_cli_config(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path == default_config_path() {
        return load_or_default(path);
    }
    if !path.exists() {
        return Err(AssetdagError::ConfigError(format!(
            "config file {:?} does not exist",
            path
        )));
    }
    load_and_validate(path)
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetdag.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetdag.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cli_config(dir.path().join("typo.toml")).unwrap_err();
        assert!(matches!(err, AssetdagError::ConfigError(_)), "{err}");
    }

    #[test]
    fn explicit_config_is_rooted_at_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        fs::write(&path, "[config]\nqueue_length = 2\n").unwrap();

        let cfg = load_cli_config(&path).unwrap();
        assert_eq!(cfg.config.queue_length, 2);
        assert_eq!(cfg.root, dir.path());
    }

    #[test]
    fn missing_file_elsewhere_falls_back_for_library_callers() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(cfg.root, dir.path());
    }
}
