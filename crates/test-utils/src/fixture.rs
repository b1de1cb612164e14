use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use assetdag::config::{ConfigFile, load_or_default};
use tempfile::TempDir;

/// A throwaway project directory.
pub struct ProjectFixture {
    _dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("creating temp project dir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    /// An empty project rooted at `<tmp>/<name>`, for names with spaces or
    /// other characters a shell would split on.
    pub fn named(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("creating temp project dir");
        let root = dir.path().join(name);
        fs::create_dir_all(&root).expect("creating project root");
        Self { _dir: dir, root }
    }

    /// A project with the standard `assets/` layout filled in.
    pub fn standard() -> Self {
        let fixture = Self::new();
        fixture
            .write("assets/sass/plugins/a.css", ".alpha {\n  color: red;\n}\n")
            .write("assets/sass/plugins/b.css", ".beta {\n  color: blue;\n}\n")
            .write(
                "assets/sass/main.scss",
                "@import 'partials/vars';\n\n.page {\n  color: $brand;\n  .title { display: flex; }\n}\n",
            )
            .write("assets/sass/partials/_vars.scss", "$brand: #336699;\n")
            .write("assets/js/plugins/lib.js", "var lib = function (x) { return x * 2; };\n")
            .write(
                "assets/js/app.js",
                "var answer = lib(21);\nif (answer === 42) {\n  console.log('ok');\n}\n",
            )
            .write("assets/fonts/icons.woff", "woff")
            .write("assets/img/logo.png", "png");
        fixture
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture dir");
        }
        fs::write(&path, contents).expect("writing fixture file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Config from `Assetdag.toml` in the fixture root, or the defaults.
    pub fn config(&self) -> ConfigFile {
        load_or_default(self.path("Assetdag.toml")).expect("loading fixture config")
    }

    /// Every file under `rel`, with its modification time.
    pub fn files_under(&self, rel: &str) -> Vec<(PathBuf, SystemTime)> {
        let mut out = Vec::new();
        let mut stack = vec![self.path(rel)];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let modified = entry
                        .metadata()
                        .and_then(|m| m.modified())
                        .expect("reading mtime");
                    out.push((path, modified));
                }
            }
        }
        out.sort();
        out
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
