// src/transform/copy.rs

use super::sources::walk_files;
use super::{AssetTransform, TransformContext, TransformReport};
use crate::errors::TransformError;

/// Copy a directory tree verbatim, preserving relative layout.
///
/// A missing source directory copies nothing.
#[derive(Debug)]
pub struct CopyTree {
    name: String,
    from: String,
    to: String,
}

impl CopyTree {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

impl AssetTransform for CopyTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        let mut report = TransformReport::default();
        let src_root = ctx.resolve(&self.from);
        let dst_root = ctx.resolve(&self.to);

        let files = walk_files(ctx.fs.as_ref(), &src_root)
            .map_err(|e| TransformError::io(&src_root, e))?;

        for src in files {
            let Ok(rel) = src.strip_prefix(&src_root) else {
                continue;
            };
            let bytes = ctx.fs.read(&src).map_err(|e| TransformError::io(&src, e))?;
            ctx.emit(&mut report, dst_root.join(rel), &bytes)?;
        }

        Ok(report)
    }
}
