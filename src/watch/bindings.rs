// src/watch/bindings.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::config::WatchConfig;
use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::transform::sources::{build_globset, relative_slash};
use crate::types::ReloadKind;

/// A compiled `[watch.<name>]` entry: glob set -> ordered task list.
#[derive(Clone)]
pub struct WatchBinding {
    name: String,
    steps: Vec<TaskName>,
    reload: ReloadKind,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn compile(name: impl Into<String>, cfg: &WatchConfig) -> Result<Self> {
        let name = name.into();
        let watch_set = build_globset(&cfg.patterns)
            .with_context(|| format!("building watch globset for binding {name}"))?;
        let exclude_set = if cfg.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&cfg.exclude)
                    .with_context(|| format!("building exclude globset for binding {name}"))?,
            )
        };

        Ok(Self {
            name,
            steps: cfg.run.clone(),
            reload: cfg.reload,
            watch_set,
            exclude_set,
            use_hash: cfg.use_hash,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks to run, in order.
    pub fn steps(&self) -> &[TaskName] {
        &self.steps
    }

    pub fn reload(&self) -> ReloadKind {
        self.reload
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Whether a path relative to the project root (e.g. `assets/img/a.png`)
    /// fires this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        !self
            .exclude_set
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(rel_path))
    }
}

/// Compile every binding of a config, in name order.
pub fn build_bindings(watch: &BTreeMap<String, WatchConfig>) -> Result<Vec<WatchBinding>> {
    watch
        .iter()
        .map(|(name, cfg)| WatchBinding::compile(name, cfg))
        .collect()
}

/// Every file under `root` that fires `binding`, sorted.
///
/// Used for content hashing of `use_hash` bindings.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    binding: &WatchBinding,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_slash(root, &path) {
                    if binding.matches(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSection;
    use crate::config::model::default_watch_bindings;

    #[test]
    fn default_bindings_partition_assets() {
        let bindings = build_bindings(&default_watch_bindings(&SiteSection::default())).unwrap();
        let fired = |rel: &str| -> Vec<&str> {
            bindings
                .iter()
                .filter(|b| b.matches(rel))
                .map(|b| b.name())
                .collect()
        };

        assert_eq!(fired("assets/img/logo.png"), vec!["images"]);
        assert_eq!(fired("assets/sass/partials/_grid.scss"), vec!["styles"]);
        assert_eq!(fired("assets/js/app.js"), vec!["scripts"]);
        assert!(fired("build/css/main.css").is_empty());
    }

    #[test]
    fn exclude_wins() {
        let mut cfg = WatchConfig::new(&["assets/**/*"], &["img"], ReloadKind::Full);
        cfg.exclude = vec!["assets/**/*.tmp".to_string()];
        let binding = WatchBinding::compile("b", &cfg).unwrap();
        assert!(binding.matches("assets/a.png"));
        assert!(!binding.matches("assets/a.tmp"));
    }
}
