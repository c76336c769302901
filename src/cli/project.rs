//! `bundle.toml` project files.
//!
//! ```toml
//! work_dir = "target/web"
//! bundle_type = "mvnpm"
//! dependencies = ["lib/lit-3.1.0.jar"]
//! entries = [{ file = "src/app.js" }]
//!
//! [esbuild]
//! minify = false
//! format = "esm"
//!
//! [bundler]
//! esbuild_version = "0.19.9"
//! event_format = "log"
//! run_timeout_secs = 300
//! ```
//!
//! Relative paths are resolved against the project file's directory.

use crate::bundler::{BundleType, Entry, EsBuildConfig, EventFormat};
use crate::error::{BundlerError, CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of a project file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectFile {
    /// Work directory
    pub work_dir: Option<PathBuf>,
    /// Packaging convention
    pub bundle_type: Option<BundleType>,
    /// Dependency archives
    pub dependencies: Vec<PathBuf>,
    /// Entry points
    pub entries: Vec<Entry>,
    /// esbuild settings
    pub esbuild: EsBuildConfig,
    /// Orchestrator settings
    pub bundler: BundlerSection,
}

/// `[bundler]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundlerSection {
    pub esbuild_version: Option<String>,
    pub executable: Option<PathBuf>,
    pub registry_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
    pub event_format: Option<EventFormat>,
    pub run_timeout_secs: Option<u64>,
    pub stop_grace_secs: Option<u64>,
}

impl ProjectFile {
    /// Reads and parses `path`, anchoring relative paths at its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let failed = |reason: String| {
            BundlerError::Cli(CliError::ProjectFile {
                path: path.display().to_string(),
                reason,
            })
        };

        let contents = std::fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
        let mut project: ProjectFile = toml::from_str(&contents).map_err(|e| failed(e.to_string()))?;

        let base = path.parent().unwrap_or(Path::new("."));
        project.anchor(base);
        Ok(project)
    }

    fn anchor(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        self.work_dir.iter_mut().for_each(join);
        self.dependencies.iter_mut().for_each(join);
        self.bundler.executable.iter_mut().for_each(join);
        self.bundler.cache_dir.iter_mut().for_each(join);
        self.bundler.archive_dir.iter_mut().for_each(join);

        for entry in &mut self.entries {
            match entry {
                Entry::File(path) => join(path),
                Entry::Script { scripts, .. } => scripts.iter_mut().for_each(join),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_anchors_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.toml");
        std::fs::write(
            &path,
            r#"
work_dir = "target/web"
bundle_type = "webjar"
dependencies = ["lib/a.jar", "/abs/b.jar"]
entries = [{ file = "src/app.js" }, { script = { name = "main", scripts = ["x.js"] } }]

[esbuild]
minify = false

[bundler]
esbuild_version = "0.20.2"
event_format = "json-lines"
"#,
        )
        .unwrap();

        let project = ProjectFile::load(&path).unwrap();
        assert_eq!(project.work_dir, Some(dir.path().join("target/web")));
        assert_eq!(project.bundle_type, Some(BundleType::Webjar));
        assert_eq!(project.dependencies[0], dir.path().join("lib/a.jar"));
        assert_eq!(project.dependencies[1], PathBuf::from("/abs/b.jar"));
        assert_eq!(project.entries[0], Entry::file(dir.path().join("src/app.js")));
        assert_eq!(
            project.entries[1],
            Entry::script("main", vec![dir.path().join("x.js")])
        );
        assert!(!project.esbuild.minify);
        assert_eq!(project.bundler.event_format, Some(EventFormat::JsonLines));
    }

    #[test]
    fn unknown_keys_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.toml");
        std::fs::write(&path, "wrok_dir = \"x\"\n").unwrap();

        let err = ProjectFile::load(&path).unwrap_err();
        assert!(matches!(err, BundlerError::Cli(CliError::ProjectFile { .. })));
    }
}
