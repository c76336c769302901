//! Orchestrator configuration.

use crate::bundler::process::EventFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Packaged version resource, `esbuild.version=<version>`.
const VERSION_PROPERTIES: &str = include_str!("../../../resources/version.properties");

/// Used when the packaged resource carries no version.
const FALLBACK_ESBUILD_VERSION: &str = "0.17.19";

/// Public npm registry serving `@esbuild/<classifier>` packages.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default bound on a one-shot esbuild run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Default time a watch process gets to exit after SIGTERM.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Returns the esbuild version this build of the crate was packaged with.
pub fn default_esbuild_version() -> String {
    VERSION_PROPERTIES
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "esbuild.version")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| FALLBACK_ESBUILD_VERSION.to_string())
}

/// Returns the default executable cache root.
///
/// Platform-specific paths:
/// - Linux: ~/.cache/kodegen/esbuild
/// - macOS: ~/Library/Caches/kodegen/esbuild
/// - Windows: %LOCALAPPDATA%\kodegen\esbuild
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kodegen")
        .join("esbuild")
}

/// Construction-time configuration of the [`Bundler`](crate::bundler::Bundler).
///
/// # Examples
///
/// ```
/// use kodegen_bundler_esbuild::bundler::BundlerConfig;
///
/// let config = BundlerConfig::default().with_esbuild_version("0.20.2");
/// assert_eq!(config.esbuild_version(), "0.20.2");
/// ```
#[derive(Clone, Debug)]
pub struct BundlerConfig {
    esbuild_version: String,
    cache_dir: PathBuf,
    archive_dir: Option<PathBuf>,
    registry_url: String,
    executable: Option<PathBuf>,
    event_format: EventFormat,
    run_timeout: Duration,
    stop_grace: Duration,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            esbuild_version: default_esbuild_version(),
            cache_dir: default_cache_dir(),
            archive_dir: None,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            executable: None,
            event_format: EventFormat::default(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

impl BundlerConfig {
    /// Pins the esbuild version.
    pub fn with_esbuild_version(mut self, version: impl Into<String>) -> Self {
        self.esbuild_version = version.into();
        self
    }

    /// Sets the executable cache root.
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = path.as_ref().to_path_buf();
        self
    }

    /// Looks for `<classifier>-<version>.tgz` in `path` before downloading.
    pub fn with_archive_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Uses another npm registry.
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Skips resolution and runs this executable.
    pub fn with_executable<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.executable = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets how watch-mode output is decoded.
    pub fn with_event_format(mut self, format: EventFormat) -> Self {
        self.event_format = format;
        self
    }

    /// Bounds one-shot runs.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Sets the grace period between SIGTERM and kill on stop.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Returns the pinned esbuild version.
    pub fn esbuild_version(&self) -> &str {
        &self.esbuild_version
    }

    /// Returns the executable cache root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the local archive directory, if any.
    pub fn archive_dir(&self) -> Option<&Path> {
        self.archive_dir.as_deref()
    }

    /// Returns the npm registry base URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Returns the executable override, if any.
    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Returns the watch-mode event format.
    pub fn event_format(&self) -> EventFormat {
        self.event_format
    }

    /// Returns the one-shot run timeout.
    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// Returns the stop grace period.
    pub fn stop_grace(&self) -> Duration {
        self.stop_grace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaged_version_is_read_from_properties() {
        let version = default_esbuild_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }

    #[test]
    fn registry_url_is_normalised() {
        let config = BundlerConfig::default().with_registry_url("https://npm.example.com/");
        assert_eq!(config.registry_url(), "https://npm.example.com");
    }

    #[test]
    fn cache_dir_ends_with_kodegen_esbuild() {
        assert!(default_cache_dir().ends_with("kodegen/esbuild"));
    }
}
