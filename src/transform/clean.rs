// src/transform/clean.rs

use tracing::debug;

use super::{AssetTransform, TransformContext, TransformReport};
use crate::errors::TransformError;

/// Remove generated directories, then recreate the (empty) output root.
#[derive(Debug)]
pub struct CleanDirs {
    remove: Vec<String>,
    recreate: String,
}

impl CleanDirs {
    pub fn new(remove: Vec<String>, recreate: impl Into<String>) -> Self {
        Self {
            remove,
            recreate: recreate.into(),
        }
    }
}

impl AssetTransform for CleanDirs {
    fn name(&self) -> &str {
        "clean"
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        for dir in &self.remove {
            let path = ctx.resolve(dir);
            debug!(path = %path.display(), "removing");
            ctx.fs
                .remove_dir_all(&path)
                .map_err(|e| TransformError::io(&path, e))?;
        }

        let out = ctx.resolve(&self.recreate);
        ctx.fs
            .create_dir_all(&out)
            .map_err(|e| TransformError::io(&out, e))?;

        Ok(TransformReport {
            outputs: vec![out],
            ..TransformReport::default()
        })
    }
}
