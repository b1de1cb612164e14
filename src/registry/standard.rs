// src/registry/standard.rs

//! The standard task set for an `assets/` -> `build/` project.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{DeploySpec, ServeSpec, TaskBody, TaskRegistry, TaskSpec};
use crate::config::{ConfigFile, WatchConfig};
use crate::errors::{AssetdagError, Result};
use crate::transform::css::browsers_from_queries;
use crate::transform::lint::Linter;
use crate::transform::{
    CleanDirs, CopyTree, ScriptBundle, ScssCompile, SharedTransform, SourceSet, VendorCssBundle,
    VendorJsBundle,
};
use crate::types::BuildMode;

fn sources(patterns: &[String]) -> Result<SourceSet> {
    SourceSet::new(patterns).map_err(|e| AssetdagError::ConfigError(format!("{e:#}")))
}

impl TaskRegistry {
    /// Build the standard tasks from a validated config.
    ///
    /// `site` only exists when `[site].command` is set; `serve`, `build` and
    /// `default` pick it up automatically in that case.
    pub fn standard(cfg: &ConfigFile) -> Result<Self> {
        let paths = &cfg.paths;
        let build = paths.build_dir.trim_end_matches('/');
        let css_dir = format!("{build}/css");
        let js_dir = format!("{build}/js");

        let browsers = browsers_from_queries(&cfg.styles.browsers)
            .map_err(|e| AssetdagError::ConfigError(format!("invalid browser query: {e}")))?;
        let linter = Linter::new().map_err(|e| AssetdagError::Other(e.into()))?;

        let vendors: Vec<SharedTransform> = vec![
            Arc::new(VendorCssBundle::new(
                sources(&paths.vendor_css)?,
                format!("{css_dir}/vendors.css"),
            )),
            Arc::new(VendorJsBundle::new(
                sources(&paths.vendor_js)?,
                format!("{js_dir}/vendors.min.js"),
            )),
            Arc::new(CopyTree::new("fonts", &paths.fonts, format!("{build}/fonts"))),
        ];

        let mut registry = TaskRegistry::new();

        registry.register(
            TaskSpec::new(
                "clean",
                TaskBody::Transforms(vec![Arc::new(CleanDirs::new(
                    paths.clean.clone(),
                    build,
                ))]),
            )
            .describe("remove output directories"),
        )?;
        registry.register(
            TaskSpec::new("vendors", TaskBody::Transforms(vendors))
                .describe("bundle vendor CSS/JS and copy fonts"),
        )?;
        registry.register(
            TaskSpec::new(
                "img",
                TaskBody::Transforms(vec![Arc::new(CopyTree::new(
                    "images",
                    &paths.images,
                    format!("{build}/img"),
                ))]),
            )
            .describe("copy images"),
        )?;
        registry.register(
            TaskSpec::new(
                "styles",
                TaskBody::Transforms(vec![Arc::new(ScssCompile::new(
                    &paths.scss_entry,
                    &css_dir,
                    browsers,
                ))]),
            )
            .describe("compile SCSS"),
        )?;
        registry.register(
            TaskSpec::new(
                "scripts",
                TaskBody::Transforms(vec![Arc::new(ScriptBundle::new(
                    sources(&paths.scripts)?,
                    &js_dir,
                    linter,
                ))]),
            )
            .describe("lint, bundle and minify scripts"),
        )?;

        let mut full_sequence = vec!["vendors", "styles", "img", "scripts"];
        let mut serve_prereqs = vec!["styles", "scripts"];

        if let Some(command) = &cfg.site.command {
            registry.register(
                TaskSpec::new(
                    "site",
                    TaskBody::External {
                        command: command.clone(),
                    },
                )
                .describe("run the site generator"),
            )?;
            full_sequence.push("site");
            serve_prereqs.push("site");
        }

        registry.register(
            TaskSpec::new(
                "serve",
                TaskBody::Serve(ServeSpec {
                    host: cfg.server.host.clone(),
                    port: cfg.server.port,
                    root: cfg.server.root.clone(),
                }),
            )
            .after(&serve_prereqs)
            .describe("serve the site with live reload and watch sources"),
        )?;

        let steps: Vec<String> = full_sequence.iter().map(|s| s.to_string()).collect();
        registry.register(
            TaskSpec::new("build", TaskBody::Sequence(steps.clone()))
                .after(&["clean"])
                .forcing(BuildMode::Production)
                .describe("clean, then build everything for production"),
        )?;
        registry.register(
            TaskSpec::new("default", TaskBody::Sequence(steps))
                .after(&["clean"])
                .describe("clean, then build everything"),
        )?;

        registry.register(
            TaskSpec::new(
                "deploy",
                TaskBody::Deploy(DeploySpec {
                    site_dir: cfg.deploy.site_dir.clone(),
                    staging_dir: cfg.deploy.staging_dir.clone(),
                    command: cfg.deploy.command.clone(),
                }),
            )
            .describe("publish the built site"),
        )?;

        registry.validate()?;
        registry.check_watch_bindings(&cfg.watch)?;
        Ok(registry)
    }

    /// Every task a watch binding runs must exist.
    pub fn check_watch_bindings(&self, watch: &BTreeMap<String, WatchConfig>) -> Result<()> {
        for (name, binding) in watch {
            for task in &binding.run {
                if !self.contains(task) {
                    return Err(AssetdagError::ConfigError(format!(
                        "watch binding '{name}' runs unknown task '{task}'"
                    )));
                }
            }
        }
        Ok(())
    }
}
