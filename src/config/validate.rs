// src/config/validate.rs

use globset::GlobBuilder;
use lightningcss::targets::Browsers;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every check on a raw config without consuming it.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_paths(cfg)?;
    validate_browsers(cfg)?;
    validate_watch_bindings(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(AssetdagError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let required = [
        ("build_dir", &paths.build_dir),
        ("fonts", &paths.fonts),
        ("images", &paths.images),
        ("scss_entry", &paths.scss_entry),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }

    for pattern in paths
        .vendor_css
        .iter()
        .chain(paths.vendor_js.iter())
        .chain(paths.scripts.iter())
    {
        check_glob(pattern, "[paths]")?;
    }

    if cfg.deploy.site_dir.trim().is_empty() || cfg.deploy.staging_dir.trim().is_empty() {
        return Err(AssetdagError::ConfigError(
            "[deploy].site_dir and [deploy].staging_dir must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_browsers(cfg: &RawConfigFile) -> Result<()> {
    if cfg.styles.browsers.is_empty() {
        return Ok(());
    }
    Browsers::from_browserslist(cfg.styles.browsers.iter()).map_err(|e| {
        AssetdagError::ConfigError(format!("[styles].browsers is not a valid query: {e}"))
    })?;
    Ok(())
}

fn validate_watch_bindings(cfg: &RawConfigFile) -> Result<()> {
    for (name, binding) in cfg.watch.iter() {
        if binding.patterns.is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "[watch.{name}] must list at least one pattern"
            )));
        }
        if binding.run.is_empty() {
            return Err(AssetdagError::ConfigError(format!(
                "[watch.{name}] must list at least one task in `run`"
            )));
        }
        let section = format!("[watch.{name}]");
        for pattern in binding.patterns.iter().chain(binding.exclude.iter()) {
            check_glob(pattern, &section)?;
        }
    }
    Ok(())
}

fn check_glob(pattern: &str, section: &str) -> Result<()> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| {
            AssetdagError::ConfigError(format!("{section}: invalid glob pattern '{pattern}': {e}"))
        })?;
    Ok(())
}
