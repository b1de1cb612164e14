// src/transform/mod.rs

//! Asset transforms.
//!
//! Each transform is a small object that reads input paths and writes output
//! paths through the [`FileSystem`] seam. Tasks are handed the transforms they
//! need by the registry; nothing is looked up by name at run time.
//!
//! - [`bundle`]: vendor CSS / JS concatenation + minification.
//! - [`copy`]: recursive passthrough copies (fonts, images).
//! - [`scss`]: SCSS entry compile with prefixing and source maps.
//! - [`scripts`]: lint + bundle + minify of the project's own scripts.
//! - [`clean`]: output directory reset.
//! - [`css`], [`js`]: thin wrappers over lightningcss and oxc.
//! - [`lint`]: line-oriented script linter.

pub mod bundle;
pub mod clean;
pub mod copy;
pub mod css;
pub mod js;
pub mod lint;
pub mod scripts;
pub mod scss;
pub mod sources;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::TransformError;
use crate::fs::FileSystem;
use crate::types::BuildMode;

pub use bundle::{VendorCssBundle, VendorJsBundle};
pub use clean::CleanDirs;
pub use copy::CopyTree;
pub use scripts::ScriptBundle;
pub use scss::ScssCompile;
pub use sources::SourceSet;

/// Everything a transform may look at while running.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Project root; transform paths are relative to it.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub mode: BuildMode,
}

impl TransformContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, mode: BuildMode) -> Self {
        Self {
            root: root.into(),
            fs,
            mode,
        }
    }

    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `path` and record it in `report`.
    pub(crate) fn emit(
        &self,
        report: &mut TransformReport,
        path: PathBuf,
        contents: &[u8],
    ) -> Result<(), TransformError> {
        self.fs
            .write(&path, contents)
            .map_err(|e| TransformError::io(&path, e))?;
        report.outputs.push(path);
        Ok(())
    }
}

/// What a transform produced.
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    pub outputs: Vec<PathBuf>,
    /// Advisory lint report, as printed to stdout.
    pub lint_report: Option<String>,
}

/// A named input→output operation.
///
/// Implementations are synchronous; the executor runs them on the blocking
/// pool so several transforms of one task can proceed concurrently.
pub trait AssetTransform: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError>;
}

/// Shared handle stored in task bodies.
pub type SharedTransform = Arc<dyn AssetTransform>;
