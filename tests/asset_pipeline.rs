// tests/asset_pipeline.rs

//! End-to-end runs of the standard tasks against a temporary project.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use assetdag::engine::RunReport;
use assetdag::execute_task;
use assetdag::fs::RealFileSystem;
use assetdag::registry::TaskRegistry;
use assetdag::transform::lint::Linter;
use assetdag::transform::scripts::ScriptBundle;
use assetdag::transform::sources::SourceSet;
use assetdag::transform::{AssetTransform, TransformContext};
use assetdag::types::BuildMode;
use assetdag_test_utils::{ProjectFixture, init_tracing, with_timeout};

async fn run(fixture: &ProjectFixture, task: &str, mode: BuildMode) -> RunReport {
    let cfg = fixture.config();
    let registry = TaskRegistry::standard(&cfg).expect("standard registry");
    with_timeout(
        30,
        execute_task(&cfg, registry, task, mode, Arc::new(RealFileSystem)),
    )
    .await
    .expect("runtime error")
}

#[tokio::test]
async fn vendor_bundles_keep_source_order_and_are_minified() {
    init_tracing();
    let project = ProjectFixture::standard();

    let report = run(&project, "vendors", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");

    let css = project.read("build/css/vendors.css");
    let alpha = css.find(".alpha").expect("a.css rules present");
    let beta = css.find(".beta").expect("b.css rules present");
    assert!(alpha < beta, "a.css must come first: {css}");
    assert!(!css.contains("\n  "), "expected minified css: {css}");

    let js = project.read("build/js/vendors.min.js");
    assert!(js.contains("lib"));
    assert!(!js.contains("\n\n"));

    assert!(project.exists("build/fonts/icons.woff"));
}

#[tokio::test]
async fn malformed_vendor_stylesheet_fails_vendors() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write("assets/sass/plugins/b.css", ".a[ { color: red }\n");

    let report = run(&project, "vendors", BuildMode::Development).await;
    let failure = report.initial_failure.expect("vendors should fail");
    assert_eq!(failure.tasks, vec!["vendors".to_string()]);
    assert!(!project.exists("build/css/vendors.css"));
}

#[tokio::test]
async fn development_styles_carry_an_inline_source_map() {
    init_tracing();
    let project = ProjectFixture::standard();

    let report = run(&project, "styles", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");

    let css = project.read("build/css/main.css");
    assert!(css.contains(".page"));
    assert!(css.contains("#336699") || css.contains("#369"), "{css}");
    assert!(css.contains("sourceMappingURL=data:"), "{css}");
}

#[tokio::test]
async fn production_styles_are_minified_without_source_map() {
    init_tracing();
    let project = ProjectFixture::standard();

    let report = run(&project, "styles", BuildMode::Production).await;
    assert!(report.succeeded(), "{report:?}");

    let css = project.read("build/css/main.css");
    assert!(css.contains(".page"));
    assert!(!css.contains("sourceMappingURL"));
    assert!(!css.contains("\n  "), "expected minified css: {css}");
}

#[tokio::test]
async fn scss_error_fails_only_the_styles_task() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write("assets/sass/main.scss", ".broken {\n  color: $undefined;\n");

    let report = run(&project, "styles", BuildMode::Development).await;
    let failure = report.initial_failure.expect("styles should fail");
    assert_eq!(failure.tasks, vec!["styles".to_string()]);
    assert!(!project.exists("build/css/main.css"));
}

#[tokio::test]
async fn lint_findings_do_not_block_script_outputs() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write(
        "assets/js/app.js",
        "var a = 1;\nif (a == 1) {\n  debugger;\n}\n",
    );

    let report = run(&project, "scripts", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");

    let bundle = project.read("build/js/main.js");
    assert!(bundle.contains("a == 1"));
    let minified = project.read("build/js/main.min.js");
    assert!(!minified.is_empty());
    assert!(minified.len() < bundle.len());
}

#[test]
fn scripts_print_a_stylish_lint_report() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write(
        "assets/js/app.js",
        "var a = 1;\nif (a == 1) {\n  debugger;\n}\n",
    );

    let scripts = ScriptBundle::new(
        SourceSet::new(&["assets/js/*.js"]).unwrap(),
        "build/js",
        Linter::new().unwrap(),
    );
    let ctx = TransformContext::new(
        project.root(),
        Arc::new(RealFileSystem),
        BuildMode::Development,
    );
    let report = scripts.run(&ctx).expect("lint findings are advisory");

    let printed = report.lint_report.expect("findings were reported");
    assert!(printed.starts_with("assets/js/app.js\n"), "{printed}");
    assert!(printed.contains("line 2"), "{printed}");
    assert!(printed.contains("(W116)"), "{printed}");
    assert!(printed.contains("(W087)"), "{printed}");
    assert!(printed.contains("0 errors"), "{printed}");
    assert_eq!(report.outputs.len(), 2);
}

#[test]
fn clean_scripts_print_nothing() {
    let project = ProjectFixture::standard();
    let scripts = ScriptBundle::new(
        SourceSet::new(&["assets/js/*.js"]).unwrap(),
        "build/js",
        Linter::new().unwrap(),
    );
    let ctx = TransformContext::new(
        project.root(),
        Arc::new(RealFileSystem),
        BuildMode::Development,
    );
    let report = scripts.run(&ctx).unwrap();
    assert!(report.lint_report.is_none());
}

#[tokio::test]
async fn build_is_production_even_without_the_flag() {
    init_tracing();
    let project = ProjectFixture::standard();

    let report = run(&project, "build", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");

    let css = project.read("build/css/main.css");
    assert!(!css.contains("sourceMappingURL"));
    assert!(!css.contains("\n  "));
    assert!(project.exists("build/js/main.min.js"));
    assert!(project.exists("build/img/logo.png"));
}

#[tokio::test]
async fn clean_build_leaves_no_stale_output() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write("build/css/stale.css", ".old {}");
    project.write("build/js/removed.js", "var gone;");
    project.write("styleguide/index.html", "<html></html>");

    // Filesystem timestamps can lag the wall clock slightly.
    let start = SystemTime::now() - Duration::from_secs(1);
    let report = run(&project, "build", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");

    assert!(!project.exists("build/css/stale.css"));
    assert!(!project.exists("build/js/removed.js"));
    assert!(!project.exists("styleguide"));

    let outputs = project.files_under("build");
    assert!(!outputs.is_empty());
    for (path, modified) in outputs {
        assert!(modified >= start, "{path:?} predates the build");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn site_generator_runs_as_part_of_default() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write(
        "Assetdag.toml",
        "[site]\ncommand = \"mkdir -p site && cp build/css/main.css site/main.css\"\n",
    );

    let report = run(&project, "default", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");
    assert!(project.exists("site/main.css"));
}

#[cfg(unix)]
#[tokio::test]
async fn external_command_exit_code_fails_the_run() {
    init_tracing();
    let project = ProjectFixture::standard();
    project.write("Assetdag.toml", "[site]\ncommand = \"exit 3\"\n");

    let report = run(&project, "default", BuildMode::Development).await;
    let failure = report.initial_failure.expect("site should fail");
    assert_eq!(failure.tasks, vec!["site".to_string()]);
    // Earlier stages still produced their output.
    assert!(project.exists("build/css/main.css"));
}

#[cfg(unix)]
#[tokio::test]
async fn deploy_stages_the_site_and_runs_the_publisher() {
    init_tracing();
    let project = ProjectFixture::new();
    project
        .write(
            "Assetdag.toml",
            "[deploy]\ncommand = \"test -f {dir}/blog/post.html && touch published\"\n",
        )
        .write("site/index.html", "<html></html>")
        .write("site/blog/post.html", "<html></html>")
        .write(".publish/leftover.txt", "old");

    let report = run(&project, "deploy", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");
    assert!(project.exists(".publish/index.html"));
    assert!(!project.exists(".publish/leftover.txt"));
    assert!(project.exists("published"));
}

#[cfg(unix)]
#[tokio::test]
async fn deploy_dir_with_spaces_reaches_the_publisher_whole() {
    init_tracing();
    let project = ProjectFixture::named("my site; $(touch pwned)");
    project
        .write(
            "Assetdag.toml",
            "[deploy]\ncommand = \"test -f {dir}/index.html && touch published\"\n",
        )
        .write("site/index.html", "<html></html>");

    let report = run(&project, "deploy", BuildMode::Development).await;
    assert!(report.succeeded(), "{report:?}");
    assert!(project.exists(".publish/index.html"));
    assert!(project.exists("published"));
    assert!(!project.exists("pwned"));
}

#[tokio::test]
async fn deploy_without_built_site_fails() {
    init_tracing();
    let project = ProjectFixture::new();

    let report = run(&project, "deploy", BuildMode::Development).await;
    assert!(report.initial_failure.is_some());
}
