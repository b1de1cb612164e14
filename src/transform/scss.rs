// src/transform/scss.rs

use std::io;
use std::path::Path;

use lightningcss::targets::Browsers;

use super::css::{self, CssOptions};
use super::{AssetTransform, TransformContext, TransformReport};
use crate::errors::TransformError;
use crate::fs::FileSystem;

/// Lets grass resolve `@import`s through the project filesystem.
#[derive(Debug)]
struct ImportFs<'a>(&'a dyn FileSystem);

impl grass::Fs for ImportFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0.read(path).map_err(|e| io::Error::other(format!("{e:#}")))
    }
}

/// Compile the SCSS entry point to `<output_dir>/<stem>.css`.
///
/// Production output is minified. Development output is readable and carries
/// an inline source map pointing at the entry file.
#[derive(Debug)]
pub struct ScssCompile {
    entry: String,
    output_dir: String,
    browsers: Option<Browsers>,
}

impl ScssCompile {
    pub fn new(
        entry: impl Into<String>,
        output_dir: impl Into<String>,
        browsers: Option<Browsers>,
    ) -> Self {
        Self {
            entry: entry.into(),
            output_dir: output_dir.into(),
            browsers,
        }
    }

    fn output_name(&self) -> String {
        let stem = Path::new(&self.entry)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("main");
        format!("{stem}.css")
    }
}

impl AssetTransform for ScssCompile {
    fn name(&self) -> &str {
        "scss"
    }

    fn run(&self, ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        let entry = ctx.resolve(&self.entry);
        let source = ctx
            .fs
            .read_to_string(&entry)
            .map_err(|e| TransformError::io(&entry, e))?;

        let import_fs = ImportFs(ctx.fs.as_ref());
        let mut options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .fs(&import_fs);
        if let Some(dir) = entry.parent() {
            options = options.load_path(dir);
        }
        let compiled = grass::from_string(source, &options).map_err(|e| TransformError::Scss {
            path: self.entry.clone(),
            message: e.to_string(),
        })?;

        let production = ctx.mode.is_production();
        let processed = css::process_css(
            &compiled,
            &self.entry,
            CssOptions {
                minify: production,
                browsers: self.browsers,
                source_map: !production,
            },
        )
        .map_err(|message| TransformError::Css {
            path: self.entry.clone(),
            message,
        })?;

        let mut report = TransformReport::default();
        let out = ctx.resolve(&self.output_dir).join(self.output_name());
        ctx.emit(&mut report, out, processed.as_bytes())?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::BuildMode;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn imports_resolve_through_the_project_filesystem() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "./assets/sass/main.scss",
            "@import 'partials/vars';\n.page { color: $brand; }\n",
        );
        fs.add_file("./assets/sass/partials/_vars.scss", "$brand: #336699;\n");

        let ctx = TransformContext::new(
            PathBuf::from("."),
            Arc::new(fs.clone()),
            BuildMode::Production,
        );
        let compile = ScssCompile::new("assets/sass/main.scss", "build/css", None);
        let report = compile.run(&ctx).unwrap();

        assert_eq!(report.outputs, vec![PathBuf::from("./build/css/main.css")]);
        let css = fs.read_to_string(Path::new("./build/css/main.css")).unwrap();
        assert!(css.contains("#369"), "{css}");
        assert!(!css.contains("sourceMappingURL"));
    }
}
