// src/transform/sources.rs

//! Glob-based source selection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// A compiled set of source globs, relative to the project root.
///
/// `*` never crosses a `/`; use `**` for recursive matches.
#[derive(Debug, Clone)]
pub struct SourceSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl SourceSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let set = build_globset(&patterns)?;
        Ok(Self { patterns, set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }

    /// Every file under `root` matching one of the globs, in directory-listing
    /// order: sorted by path relative to `root`, so `a.css` precedes `b.css`.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();

        for pattern in &self.patterns {
            let base = root.join(glob_base(pattern));
            if !fs.is_dir(&base) {
                continue;
            }

            let mut stack = vec![base];
            while let Some(dir) = stack.pop() {
                for path in fs.read_dir(&dir)? {
                    if fs.is_dir(&path) {
                        stack.push(path);
                    } else if fs.is_file(&path) {
                        if let Some(rel) = relative_slash(root, &path) {
                            if self.set.is_match(&rel) {
                                found.insert(rel, path);
                            }
                        }
                    }
                }
            }
        }

        Ok(found.into_values().collect())
    }
}

/// Build a `GlobSet` where `*` does not match path separators.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// The literal directory prefix of a glob, i.e. where a walk has to start.
///
/// `assets/js/plugins/*.js` -> `assets/js/plugins`, `**/*.css` -> ``.
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();
    for (i, comp) in components.iter().enumerate() {
        let is_last = i + 1 == components.len();
        if is_last || comp.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(comp);
    }
    base
}

/// `path` relative to `root` with forward slashes.
pub fn relative_slash(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Recursively list every file below `dir` (sorted), or nothing if `dir`
/// does not exist.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs.is_dir(dir) {
        return Ok(files);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for path in fs.read_dir(&current)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
