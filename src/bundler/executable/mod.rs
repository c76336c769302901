//! Version-pinned esbuild executable cache.
//!
//! Executables live at `<cache_root>/<version>/esbuild[.exe]`. A version is
//! installed at most once: in-process callers serialize on a per-version
//! async mutex, other processes on an advisory lock file
//! (`<cache_root>/<version>.lock`). Extraction happens in a staging
//! directory inside the cache root which is renamed into place, so a
//! half-written binary is never visible.

mod download;
mod extract;
mod platform;

pub use platform::PlatformPackage;

use crate::bundler::error::ResolutionError;
use crate::bundler::settings::{BundlerConfig, DEFAULT_REGISTRY_URL};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Result<T> = std::result::Result<T, ResolutionError>;

#[cfg(unix)]
type FileLock = nix::fcntl::Flock<std::fs::File>;
#[cfg(not(unix))]
type FileLock = ();

/// Resolves esbuild versions to verified executables on disk.
///
/// Share one instance behind an [`Arc`]; concurrent resolutions of the same
/// version extract once and return the same path.
#[derive(Debug)]
pub struct ExecutableCache {
    root: PathBuf,
    archive_dir: Option<PathBuf>,
    registry_url: String,
    resolved: Mutex<HashMap<String, PathBuf>>,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    extractions: AtomicUsize,
}

impl ExecutableCache {
    /// Creates a cache rooted at `root` that downloads from the public npm
    /// registry.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            archive_dir: None,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            resolved: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            extractions: AtomicUsize::new(0),
        }
    }

    /// Creates a cache from the orchestrator configuration.
    pub fn from_config(config: &BundlerConfig) -> Self {
        let cache = Self::new(config.cache_dir()).with_registry_url(config.registry_url());
        match config.archive_dir() {
            Some(dir) => cache.with_archive_dir(dir),
            None => cache,
        }
    }

    /// Prefers `<dir>/<classifier>-<version>.tgz` over the registry.
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Downloads from another registry.
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of archives this instance has extracted and published.
    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }

    /// Returns the executable for `version`, installing it on first use.
    pub async fn resolve(&self, version: &str) -> Result<PathBuf> {
        let version = version.trim();
        if version.is_empty() {
            return Err(ResolutionError::EmptyVersion);
        }
        if let Some(path) = self.memoized(version) {
            return Ok(path);
        }

        let gate = self.gate(version);
        let _guard = gate.lock().await;

        // Another task may have finished while we waited
        if let Some(path) = self.memoized(version) {
            return Ok(path);
        }

        let package = PlatformPackage::host().ok_or_else(|| ResolutionError::UnsupportedPlatform {
            version: version.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        })?;
        let executable = self.root.join(version).join(package.binary_name());

        if extract::is_executable(&executable) {
            log::debug!("esbuild {version} found in cache at {}", executable.display());
            return Ok(self.memoize(version, executable));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| self.io_error(version, &self.root, source))?;
        let _lock = self.lock_version(version).await?;

        // Another process may have published while we waited on the lock
        if extract::is_executable(&executable) {
            log::debug!("esbuild {version} published by another process");
            return Ok(self.memoize(version, executable));
        }

        let tarball = self.acquire_tarball(package, version).await?;
        self.publish(package, version, tarball).await?;
        self.extractions.fetch_add(1, Ordering::SeqCst);

        log::info!("Installed esbuild {version} at {}", executable.display());
        Ok(self.memoize(version, executable))
    }

    fn memoized(&self, version: &str) -> Option<PathBuf> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(version)
            .cloned()
    }

    fn memoize(&self, version: &str, path: PathBuf) -> PathBuf {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(version.to_string(), path.clone());
        path
    }

    fn gate(&self, version: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(version.to_string())
            .or_default()
            .clone()
    }

    fn io_error(&self, version: &str, path: &Path, source: io::Error) -> ResolutionError {
        ResolutionError::Io {
            version: version.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Blocks (on a worker thread) until this process holds the advisory
    /// lock for `version`. Released on drop.
    async fn lock_version(&self, version: &str) -> Result<FileLock> {
        let path = self.root.join(format!("{version}.lock"));
        let lock_path = path.clone();
        let locked = tokio::task::spawn_blocking(move || acquire_lock(&lock_path))
            .await
            .map_err(io::Error::other)
            .and_then(|r| r);
        locked.map_err(|source| self.io_error(version, &path, source))
    }

    async fn acquire_tarball(&self, package: PlatformPackage, version: &str) -> Result<Vec<u8>> {
        let Some(dir) = &self.archive_dir else {
            return download::fetch_tarball(&self.registry_url, package, version).await;
        };

        let local = dir.join(package.archive_file_name(version));
        match tokio::fs::read(&local).await {
            Ok(bytes) => {
                log::debug!("Using local esbuild archive {}", local.display());
                return Ok(bytes);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} not found, falling back to registry", local.display());
            }
            Err(source) => return Err(self.io_error(version, &local, source)),
        }

        match download::fetch_tarball(&self.registry_url, package, version).await {
            Err(ResolutionError::Download { url, reason, .. }) => Err(ResolutionError::ArchiveMissing {
                version: version.to_string(),
                reason: format!("{} does not exist and {url} failed: {reason}", local.display()),
            }),
            fetched => fetched,
        }
    }

    async fn publish(&self, package: PlatformPackage, version: &str, tarball: Vec<u8>) -> Result<()> {
        let root = self.root.clone();
        let target = self.root.join(version);
        let owned_version = version.to_string();

        let published = tokio::task::spawn_blocking(move || {
            publish_blocking(&root, &target, package, &tarball)
        })
        .await
        .map_err(|e| ResolutionError::Extraction {
            version: owned_version,
            path: self.root.clone(),
            reason: e.to_string(),
        })?;

        published.map_err(|e| ResolutionError::Extraction {
            version: version.to_string(),
            path: self.root.join(version),
            reason: e.to_string(),
        })
    }
}

#[cfg(unix)]
fn acquire_lock(path: &Path) -> io::Result<FileLock> {
    use nix::fcntl::{Flock, FlockArg};

    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| io::Error::from(errno))
}

#[cfg(not(unix))]
fn acquire_lock(_path: &Path) -> io::Result<FileLock> {
    Ok(())
}

/// Extracts into a fresh staging directory and renames it to `target`.
///
/// The staging directory is removed on every failure path when the
/// `TempDir` drops.
fn publish_blocking(
    root: &Path,
    target: &Path,
    package: PlatformPackage,
    tarball: &[u8],
) -> io::Result<()> {
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(root)?;
    let staged = staging.path().join(package.binary_name());
    extract::extract_binary(tarball, package.archive_entry(), &staged)?;

    // A directory without a usable binary is debris from an interrupted run
    if target.exists() && !extract::is_executable(&target.join(package.binary_name())) {
        log::warn!("Removing incomplete cache entry {}", target.display());
        std::fs::remove_dir_all(target)?;
    }

    match std::fs::rename(staging.path(), target) {
        Ok(()) => Ok(()),
        Err(_) if extract::is_executable(&target.join(package.binary_name())) => {
            log::debug!("{} already published, keeping it", target.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
