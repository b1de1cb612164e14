// src/watch/hash.rs

//! Content hashing for `use_hash` watch bindings.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// blake3 hash of a single file, hex encoded.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Aggregate of per-file hashes.
///
/// `hashes` must be ordered by the corresponding file path.
pub fn compute_aggregate_hash(hashes: &[String]) -> String {
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Last seen aggregate hash per binding.
pub trait HashStore: Send + Sync {
    fn load(&self, binding: &str) -> Option<String>;
    fn save(&mut self, binding: &str, hash: &str);
}

/// Hashes kept for the lifetime of the `serve` session.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, binding: &str) -> Option<String> {
        self.map.get(binding).cloned()
    }

    fn save(&mut self, binding: &str, hash: &str) {
        debug!(binding = %binding, hash = %hash, "stored binding hash");
        self.map.insert(binding.to_string(), hash.to_string());
    }
}

/// Per-file hashes, so a batch only re-hashes the files it touched.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<String> {
        if let Some(hash) = self.hashes.get(path) {
            return Ok(hash.clone());
        }
        let hash = compute_file_hash(fs, path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Forget `path`; returns whether it was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.hashes.remove(path).is_some()
    }
}
