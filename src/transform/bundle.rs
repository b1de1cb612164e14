// src/transform/bundle.rs

//! Vendor bundles: concatenate third-party sources, then minify.

use std::path::PathBuf;

use tracing::debug;

use super::sources::{SourceSet, relative_slash};
use super::{AssetTransform, TransformContext, TransformReport, css, js};
use crate::errors::TransformError;

/// Concatenate `files` in order, joined by a newline.
pub(crate) fn concat_sources(
    ctx: &TransformContext,
    files: &[PathBuf],
) -> Result<String, TransformError> {
    let mut parts = Vec::with_capacity(files.len());
    for path in files {
        let text = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| TransformError::io(path, e))?;
        parts.push(text);
    }
    Ok(parts.join("\n"))
}

fn collect(ctx: &TransformContext, sources: &SourceSet) -> Result<Vec<PathBuf>, TransformError> {
    sources
        .collect(ctx.fs.as_ref(), &ctx.root)
        .map_err(|e| TransformError::io(&ctx.root, e))
}

/// `vendors.css`: every matching stylesheet, minified.
#[derive(Debug)]
pub struct VendorCssBundle {
    sources: SourceSet,
    output: String,
}

impl VendorCssBundle {
    pub fn new(sources: SourceSet, output: impl Into<String>) -> Self {
        Self {
            sources,
            output: output.into(),
        }
    }
}

impl AssetTransform for VendorCssBundle {
    fn name(&self) -> &str {
        "vendor-css"
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        let mut report = TransformReport::default();
        let files = collect(ctx, &self.sources)?;
        if files.is_empty() {
            debug!(patterns = ?self.sources.patterns(), "no vendor stylesheets");
            return Ok(report);
        }

        let joined = concat_sources(ctx, &files)?;
        let minified = css::minify_css(&joined, &self.output).map_err(|message| {
            TransformError::Css {
                path: self.output.clone(),
                message,
            }
        })?;

        ctx.emit(&mut report, ctx.resolve(&self.output), minified.as_bytes())?;
        Ok(report)
    }
}

/// `vendors.min.js`: every matching script, minified.
#[derive(Debug)]
pub struct VendorJsBundle {
    sources: SourceSet,
    output: String,
}

impl VendorJsBundle {
    pub fn new(sources: SourceSet, output: impl Into<String>) -> Self {
        Self {
            sources,
            output: output.into(),
        }
    }
}

impl AssetTransform for VendorJsBundle {
    fn name(&self) -> &str {
        "vendor-js"
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        let mut report = TransformReport::default();
        let files = collect(ctx, &self.sources)?;
        if files.is_empty() {
            debug!(patterns = ?self.sources.patterns(), "no vendor scripts");
            return Ok(report);
        }

        let joined = concat_sources(ctx, &files)?;
        let minified = js::minify_js(&joined).map_err(|message| TransformError::Js {
            path: files
                .iter()
                .filter_map(|p| relative_slash(&ctx.root, p))
                .collect::<Vec<_>>()
                .join(", "),
            message,
        })?;

        ctx.emit(&mut report, ctx.resolve(&self.output), minified.as_bytes())?;
        Ok(report)
    }
}
