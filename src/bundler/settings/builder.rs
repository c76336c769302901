//! Builder for constructing BundleOptions.

use super::{BundleOptions, BundleType, EsBuildConfig, Entry};
use std::path::{Path, PathBuf};

/// Builder for constructing [`BundleOptions`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_esbuild::bundler::{BundleOptionsBuilder, BundleType, Entry};
///
/// # fn example() -> kodegen_bundler_esbuild::bundler::Result<()> {
/// let options = BundleOptionsBuilder::new()
///     .bundle_type(BundleType::Mvnpm)
///     .dependency("lib/lit-3.1.0.jar")
///     .entry(Entry::file("/src/app.js"))
///     .work_dir("target/web")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BundleOptionsBuilder {
    dependencies: Vec<PathBuf>,
    bundle_type: BundleType,
    entries: Vec<Entry>,
    work_dir: Option<PathBuf>,
    esbuild_config: EsBuildConfig,
}

impl BundleOptionsBuilder {
    /// Creates a new options builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds one dependency archive.
    pub fn dependency<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dependencies.push(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the dependency archives.
    pub fn dependencies(mut self, paths: Vec<PathBuf>) -> Self {
        self.dependencies = paths;
        self
    }

    /// Sets the packaging convention.
    ///
    /// Default: [`BundleType::Mvnpm`]
    pub fn bundle_type(mut self, bundle_type: BundleType) -> Self {
        self.bundle_type = bundle_type;
        self
    }

    /// Adds one entry point.
    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Replaces the entry points.
    pub fn entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    /// Uses a caller-owned work directory.
    ///
    /// Default: None (fresh temporary directory)
    pub fn work_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.work_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets passthrough esbuild settings.
    ///
    /// Default: [`EsBuildConfig::default`]
    pub fn esbuild_config(mut self, config: EsBuildConfig) -> Self {
        self.esbuild_config = config;
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry point was added.
    pub fn build(self) -> crate::bundler::Result<BundleOptions> {
        if self.entries.is_empty() {
            crate::bail!("at least one entry point is required");
        }

        Ok(BundleOptions::new(
            self.dependencies,
            self.bundle_type,
            self.entries,
            self.work_dir,
            self.esbuild_config,
        ))
    }
}
