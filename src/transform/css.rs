// src/transform/css.rs

//! Stylesheet post-processing with lightningcss.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

/// How a stylesheet should be printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssOptions {
    /// Strip whitespace and comments.
    pub minify: bool,
    /// Add vendor prefixes needed by these browsers.
    pub browsers: Option<Browsers>,
    /// Append an inline source map comment.
    pub source_map: bool,
}

/// Parse, prefix and print `code`.
///
/// `filename` is recorded as the source of the map, so a development
/// stylesheet points back at the entry file that produced it.
pub fn process_css(code: &str, filename: &str, opts: CssOptions) -> Result<String, String> {
    let parser_options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };
    let mut stylesheet =
        StyleSheet::parse(code, parser_options).map_err(|e| e.to_string())?;

    let targets = match opts.browsers {
        Some(browsers) => Targets::from(browsers),
        None => Targets::default(),
    };

    stylesheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let mut source_map = if opts.source_map {
        let mut sm = SourceMap::new("/");
        sm.add_source(filename);
        sm.set_source_content(0, code).map_err(|e| e.to_string())?;
        Some(sm)
    } else {
        None
    };

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: opts.minify,
            source_map: source_map.as_mut(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let mut out = printed.code;
    if let Some(sm) = source_map.as_mut() {
        let url = sm.to_data_url(None).map_err(|e| e.to_string())?;
        out.push_str(&format!("\n/*# sourceMappingURL={url} */\n"));
    }
    Ok(out)
}

/// Minify without prefixing or source maps.
pub fn minify_css(code: &str, filename: &str) -> Result<String, String> {
    process_css(
        code,
        filename,
        CssOptions {
            minify: true,
            ..CssOptions::default()
        },
    )
}

/// Resolve browserslist queries to lightningcss targets.
pub fn browsers_from_queries(queries: &[String]) -> Result<Option<Browsers>, String> {
    Browsers::from_browserslist(queries.iter()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_strips_whitespace() {
        let out = minify_css("a {\n  color: red;\n}\n\nb { margin: 0 }\n", "x.css").unwrap();
        assert!(!out.contains('\n'), "unexpected newline in {out:?}");
        assert!(out.contains("a{color:red}"));
    }

    #[test]
    fn source_map_is_inlined_on_request() {
        let out = process_css(
            "a { color: red; }",
            "assets/sass/main.scss",
            CssOptions {
                source_map: true,
                ..CssOptions::default()
            },
        )
        .unwrap();
        assert!(out.contains("sourceMappingURL=data:application/json"));
    }

    #[test]
    fn default_browser_matrix_resolves() {
        let queries: Vec<String> = ["last 2 versions", "ie 9"].iter().map(|s| s.to_string()).collect();
        assert!(browsers_from_queries(&queries).unwrap().is_some());
    }
}
