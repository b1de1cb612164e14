// src/transform/js.rs

//! Script parsing and minification with oxc.

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parse `source` as a classic script and return its syntax errors, if any.
pub fn syntax_errors(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    let mut errors: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
    if ret.panicked && errors.is_empty() {
        errors.push("parser aborted".to_string());
    }
    errors
}

/// Minify `source`. Fails with the first syntax error.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
    }
    if ret.panicked {
        return Err("parser aborted".to_string());
    }

    let code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .build(&ret.program)
        .code;
    Ok(code)
}
