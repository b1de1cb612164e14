use std::fmt;

use serde::Deserialize;

/// Behaviour when a new run request arrives while a run is already in progress.
///
/// - `Queue`: remember the request and start it when the current run
///   finishes (default). Identical pending requests are merged.
/// - `Drop`: ignore the request entirely.
/// - `Latest`: forget any previously queued request and only keep the newest.
///
/// A running plan is never cancelled; these only govern what runs *next*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Drop,
    Latest,
}

/// Output flavour selected for a run.
///
/// Passed explicitly to every transform; there is no global flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Minified output, no source maps.
    Production,
    /// Readable output with inline source maps.
    #[default]
    Development,
}

impl BuildMode {
    pub fn from_flag(production: bool) -> Self {
        if production {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Production => f.write_str("production"),
            BuildMode::Development => f.write_str("development"),
        }
    }
}

/// What connected browsers should do after a watch-triggered run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Reload the whole page.
    Full,
    /// Re-fetch stylesheets without reloading the page.
    Styles,
}

impl ReloadKind {
    /// The reload that covers both `self` and `other`.
    pub fn covering(self, other: ReloadKind) -> ReloadKind {
        match (self, other) {
            (ReloadKind::Styles, ReloadKind::Styles) => ReloadKind::Styles,
            _ => ReloadKind::Full,
        }
    }
}
