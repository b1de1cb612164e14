// src/transform/lint.rs

//! A small line-oriented linter for the project's own scripts.
//!
//! Findings never fail a task; they are printed as a "stylish" report.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::js;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub file: PathBuf,
    /// 1-based; 0 when the location is unknown.
    pub line: usize,
    pub column: usize,
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug)]
struct LineRule {
    code: &'static str,
    message: &'static str,
    pattern: Regex,
    /// Only flag matches of exactly this length (0 = any).
    exact_len: usize,
}

#[derive(Debug)]
pub struct Linter {
    rules: Vec<LineRule>,
}

impl Linter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = vec![
            LineRule {
                code: "W116",
                message: "Expected a strict comparison and instead saw a loose one.",
                pattern: Regex::new(r"[=!]==?")?,
                exact_len: 2,
            },
            LineRule {
                code: "W087",
                message: "Forgotten 'debugger' statement?",
                pattern: Regex::new(r"\bdebugger\b")?,
                exact_len: 0,
            },
            LineRule {
                code: "W061",
                message: "eval can be harmful.",
                pattern: Regex::new(r"\beval\s*\(")?,
                exact_len: 0,
            },
            LineRule {
                code: "W102",
                message: "Trailing whitespace.",
                pattern: Regex::new(r"[ \t]+$")?,
                exact_len: 0,
            },
        ];
        Ok(Self { rules })
    }

    pub fn lint_source(&self, file: &Path, source: &str) -> Vec<LintFinding> {
        let mut findings = Vec::new();

        for message in js::syntax_errors(source) {
            findings.push(LintFinding {
                file: file.to_path_buf(),
                line: 0,
                column: 0,
                code: "E001",
                message,
                severity: Severity::Error,
            });
        }

        for (idx, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();
            let is_comment = trimmed.starts_with("//") || trimmed.starts_with('*');

            for rule in &self.rules {
                if is_comment && rule.code != "W102" {
                    continue;
                }
                for m in rule.pattern.find_iter(line) {
                    if rule.exact_len != 0 && m.as_str().len() != rule.exact_len {
                        continue;
                    }
                    findings.push(LintFinding {
                        file: file.to_path_buf(),
                        line: idx + 1,
                        column: m.start() + 1,
                        code: rule.code,
                        message: rule.message.to_string(),
                        severity: Severity::Warning,
                    });
                }
            }
        }

        findings.sort_by_key(|f| (f.line, f.column));
        findings
    }
}

/// Render findings grouped by file, followed by a summary line.
pub fn stylish_report(findings: &[LintFinding], root: &Path) -> String {
    let mut out = String::new();
    let mut current: Option<&Path> = None;

    for f in findings {
        if current != Some(f.file.as_path()) {
            if current.is_some() {
                out.push('\n');
            }
            let shown = f.file.strip_prefix(root).unwrap_or(&f.file);
            let _ = writeln!(out, "{}", shown.display());
            current = Some(f.file.as_path());
        }
        let mark = match f.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if f.line == 0 {
            let _ = writeln!(out, "  {mark}  {}  ({})", f.message, f.code);
        } else {
            let _ = writeln!(
                out,
                "  line {}  col {}  {mark}  {}  ({})",
                f.line, f.column, f.message, f.code
            );
        }
    }

    if !findings.is_empty() {
        let errors = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        let warnings = findings.len() - errors;
        let _ = writeln!(out, "\n✖ {} problems ({errors} errors, {warnings} warnings)", findings.len());
    }
    out
}
