// src/transform/scripts.rs

use tracing::warn;

use super::bundle::concat_sources;
use super::lint::{Linter, stylish_report};
use super::sources::SourceSet;
use super::{AssetTransform, TransformContext, TransformReport, js};
use crate::errors::TransformError;

/// Lint, bundle and minify the project's own scripts.
///
/// Writes `<output_dir>/main.js` and `<output_dir>/main.min.js`. Lint findings
/// are reported but never fail the transform; a syntax error does, because
/// minification needs a parse.
#[derive(Debug)]
pub struct ScriptBundle {
    sources: SourceSet,
    output_dir: String,
    linter: Linter,
}

impl ScriptBundle {
    pub fn new(sources: SourceSet, output_dir: impl Into<String>, linter: Linter) -> Self {
        Self {
            sources,
            output_dir: output_dir.into(),
            linter,
        }
    }
}

impl AssetTransform for ScriptBundle {
    fn name(&self) -> &str {
        "scripts"
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        let mut report = TransformReport::default();
        let files = self
            .sources
            .collect(ctx.fs.as_ref(), &ctx.root)
            .map_err(|e| TransformError::io(&ctx.root, e))?;

        let mut findings = Vec::new();
        for path in &files {
            let text = ctx
                .fs
                .read_to_string(path)
                .map_err(|e| TransformError::io(path, e))?;
            findings.extend(self.linter.lint_source(path, &text));
        }
        if !findings.is_empty() {
            let rendered = stylish_report(&findings, &ctx.root);
            println!("{rendered}");
            warn!(count = findings.len(), "lint findings in scripts");
            report.lint_report = Some(rendered);
        }

        let bundle = concat_sources(ctx, &files)?;
        let out_dir = ctx.resolve(&self.output_dir);
        ctx.emit(&mut report, out_dir.join("main.js"), bundle.as_bytes())?;

        let minified = js::minify_js(&bundle).map_err(|message| TransformError::Js {
            path: format!("{}/main.js", self.output_dir),
            message,
        })?;
        ctx.emit(&mut report, out_dir.join("main.min.js"), minified.as_bytes())?;

        Ok(report)
    }
}
