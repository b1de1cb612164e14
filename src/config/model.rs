// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{ReloadKind, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [paths]
/// build_dir = "build"
/// scss_entry = "assets/sass/main.scss"
///
/// [site]
/// command = "bundle exec jekyll build --destination site"
///
/// [watch.styles]
/// patterns = ["assets/sass/**/*.scss"]
/// run = ["vendors", "styles"]
/// reload = "styles"
/// ```
///
/// Every section is optional; the defaults describe the usual
/// `assets/` -> `build/` project layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub deploy: DeploySection,

    /// Watch bindings from `[watch.<name>]`, layered over the built-in ones.
    #[serde(default)]
    pub watch: BTreeMap<String, WatchConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Project root; every relative path in the config is resolved against it.
    pub root: PathBuf,
    pub config: ConfigSection,
    pub paths: PathsSection,
    pub styles: StylesSection,
    pub server: ServerSection,
    pub site: SiteSection,
    pub deploy: DeploySection,
    /// Effective watch bindings (built-ins merged with `[watch.<name>]`).
    pub watch: BTreeMap<String, WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let mut watch = default_watch_bindings(&raw.site);
        watch.extend(raw.watch);

        Self {
            root: PathBuf::from("."),
            config: raw.config,
            paths: raw.paths,
            styles: raw.styles,
            server: raw.server,
            site: raw.site,
            deploy: raw.deploy,
            watch,
        }
    }

    /// Re-root the configuration (the loader uses the config file's directory).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// `[config]` section: engine behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"queue"`, `"drop"` or `"latest"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of pending run requests to remember.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[paths]` section: where assets come from and where they go.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Output tree root; `css/`, `js/`, `fonts/`, `img/` live below it.
    pub build_dir: String,
    /// Directories removed by `clean`.
    pub clean: Vec<String>,
    /// Globs for vendor stylesheets, concatenated into `vendors.css`.
    pub vendor_css: Vec<String>,
    /// Globs for vendor scripts, concatenated into `vendors.min.js`.
    pub vendor_js: Vec<String>,
    /// Font source directory (copied recursively).
    pub fonts: String,
    /// Image source directory (copied recursively).
    pub images: String,
    /// The single SCSS entry point.
    pub scss_entry: String,
    /// Globs for the project's own scripts (linted and bundled).
    pub scripts: Vec<String>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            build_dir: "build".to_string(),
            clean: vec!["build".to_string(), "styleguide".to_string()],
            vendor_css: vec!["assets/sass/plugins/*.css".to_string()],
            vendor_js: vec!["assets/js/plugins/*.js".to_string()],
            fonts: "assets/fonts".to_string(),
            images: "assets/img".to_string(),
            scss_entry: "assets/sass/main.scss".to_string(),
            scripts: vec!["assets/js/*.js".to_string()],
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    /// Browserslist queries used for vendor prefixing.
    pub browsers: Vec<String>,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            browsers: [
                "last 2 versions",
                "safari 5",
                "ie 8",
                "ie 9",
                "ff 27",
                "opera 12.1",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// `[server]` section for `serve`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Directory served over HTTP.
    pub root: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: "site".to_string(),
        }
    }
}

/// `[site]` section: optional external static-site generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    /// Shell command that generates the site. When absent, no `site` task
    /// exists and the generator is assumed to run as a separate step.
    pub command: Option<String>,
    /// Markup/content globs that re-run the generator under `serve`.
    pub watch: Vec<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            command: None,
            watch: vec![
                "index.html".to_string(),
                "_layouts/*.html".to_string(),
                "_posts/*.{markdown,md}".to_string(),
            ],
        }
    }
}

/// `[deploy]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploySection {
    /// Built site directory to publish.
    pub site_dir: String,
    /// Scratch directory the site is copied into before publishing.
    pub staging_dir: String,
    /// Publisher command; `{dir}` is replaced by the staging directory.
    pub command: String,
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            site_dir: "site".to_string(),
            staging_dir: ".publish".to_string(),
            command: "ghp-import --no-jekyll --push --force {dir}".to_string(),
        }
    }
}

/// `[watch.<name>]` section: one watch binding.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Globs (relative to the project root) that fire this binding.
    pub patterns: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Tasks to run, strictly in this order.
    pub run: Vec<String>,

    /// Browser reload to request after a successful run.
    #[serde(default = "default_reload")]
    pub reload: ReloadKind,

    /// Only fire when the aggregated content of matched files changed.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_reload() -> ReloadKind {
    ReloadKind::Full
}

impl WatchConfig {
    pub fn new(patterns: &[&str], run: &[&str], reload: ReloadKind) -> Self {
        Self {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            run: run.iter().map(|s| s.to_string()).collect(),
            reload,
            use_hash: false,
        }
    }
}

/// Built-in watch bindings for the standard layout.
pub fn default_watch_bindings(site: &SiteSection) -> BTreeMap<String, WatchConfig> {
    let mut bindings = BTreeMap::new();
    bindings.insert(
        "styles".to_string(),
        WatchConfig::new(
            &["assets/sass/**/*.scss"],
            &["vendors", "styles"],
            ReloadKind::Styles,
        ),
    );
    bindings.insert(
        "images".to_string(),
        WatchConfig::new(&["assets/img/**/*"], &["img"], ReloadKind::Full),
    );
    bindings.insert(
        "scripts".to_string(),
        WatchConfig::new(
            &["assets/js/**/*.js"],
            &["vendors", "scripts"],
            ReloadKind::Full,
        ),
    );

    if site.command.is_some() && !site.watch.is_empty() {
        let patterns: Vec<&str> = site.watch.iter().map(|s| s.as_str()).collect();
        bindings.insert(
            "site".to_string(),
            WatchConfig::new(&patterns, &["site"], ReloadKind::Full),
        );
    }

    bindings
}
