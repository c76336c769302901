//! Per-call bundle options.

use super::{BundleType, EsBuildConfig, Entry};
use std::path::{Path, PathBuf};

/// Everything one bundle or watch call needs.
///
/// Constructed via [`BundleOptionsBuilder`](super::BundleOptionsBuilder).
#[derive(Clone, Debug)]
pub struct BundleOptions {
    /// Dependency archives, installed in order.
    dependencies: Vec<PathBuf>,

    /// Packaging convention of `dependencies`.
    bundle_type: BundleType,

    /// Entry points.
    entries: Vec<Entry>,

    /// Caller-owned work directory.
    ///
    /// None means a fresh temporary directory per call.
    work_dir: Option<PathBuf>,

    /// Passthrough esbuild settings.
    esbuild_config: EsBuildConfig,
}

impl BundleOptions {
    /// Returns the dependency archives.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }

    /// Returns the packaging convention.
    pub fn bundle_type(&self) -> BundleType {
        self.bundle_type
    }

    /// Returns the entry points.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the caller-owned work directory, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// Returns the esbuild settings.
    pub fn esbuild_config(&self) -> &EsBuildConfig {
        &self.esbuild_config
    }

    pub(super) fn new(
        dependencies: Vec<PathBuf>,
        bundle_type: BundleType,
        entries: Vec<Entry>,
        work_dir: Option<PathBuf>,
        esbuild_config: EsBuildConfig,
    ) -> Self {
        Self {
            dependencies,
            bundle_type,
            entries,
            work_dir,
            esbuild_config,
        }
    }
}
