//! Staging of webjar/mvnpm archives into a `node_modules` tree.
//!
//! Each archive is unzipped once into `<root>/tmp/<file stem>`. The embedded
//! npm package (located by its `package.json`) is then moved to
//! `<root>/node_modules/<name>`. Re-installing is keyed on the staging
//! directory: an archive whose staging directory exists is skipped, even if
//! its contents changed since. [`DependencyInstaller::clear`] removes the
//! installed tree; staging directories stay until the root is removed.
//!
//! A failing archive leaves no staging directory behind. When the failing
//! call created `node_modules`, everything it installed is removed as well.

mod unzip;

use crate::bundler::error::{InstallError, Result};
use crate::bundler::settings::BundleType;
use crate::bundler::utils::fs::{move_dir_blocking, remove_dir_all, remove_dir_all_blocking};
use crate::metadata;
use std::path::{Path, PathBuf};

/// Why an archive contributed no package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Staging directory already present from an earlier install
    AlreadyStaged,
    /// No `package.json` under the layout's manifest prefix
    ManifestNotFound,
    /// `node_modules/<name>` already installed (first archive wins)
    PackageExists {
        /// Declared package name
        name: String,
    },
}

/// A package moved into `node_modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Declared package name
    pub name: String,
    /// Archive the package came from
    pub archive: PathBuf,
    /// `<root>/node_modules/<name>`
    pub path: PathBuf,
}

/// An archive that was not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArchive {
    /// Archive path as given
    pub archive: PathBuf,
    /// Reason
    pub reason: Skip,
}

/// Outcome of an install call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    root: PathBuf,
    installed: Vec<InstalledPackage>,
    skipped: Vec<SkippedArchive>,
}

impl InstallReport {
    /// Dependency root the archives were installed into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/node_modules`
    pub fn node_modules(&self) -> PathBuf {
        self.root.join("node_modules")
    }

    /// Packages installed by this call, in archive order.
    pub fn installed(&self) -> &[InstalledPackage] {
        &self.installed
    }

    /// Archives skipped by this call, in archive order.
    pub fn skipped(&self) -> &[SkippedArchive] {
        &self.skipped
    }
}

enum Outcome {
    Installed(InstalledPackage),
    Skipped(Skip),
}

/// Installs dependency archives into one dependency root.
///
/// A root is expected to be used by one installer call at a time.
#[derive(Debug, Clone)]
pub struct DependencyInstaller {
    root: PathBuf,
}

impl DependencyInstaller {
    /// Creates an installer for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Dependency root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Installs `archives` in order, merging into any existing tree.
    pub async fn install(&self, archives: &[PathBuf], bundle_type: BundleType) -> Result<InstallReport> {
        let root = self.root.clone();
        let archives = archives.to_vec();

        tokio::task::spawn_blocking(move || install_blocking(root, &archives, bundle_type))
            .await?
    }

    /// Removes `<root>/node_modules`. Succeeds when it does not exist.
    pub async fn clear(&self) -> Result<()> {
        let node_modules = self.root.join("node_modules");
        log::debug!("Clearing {}", node_modules.display());
        remove_dir_all(&node_modules).await
    }
}

fn install_blocking(root: PathBuf, archives: &[PathBuf], bundle_type: BundleType) -> Result<InstallReport> {
    let node_modules = root.join("node_modules");
    let fresh = !node_modules.is_dir();
    std::fs::create_dir_all(&node_modules).map_err(|source| InstallError::Io {
        context: "creating node_modules".to_string(),
        path: node_modules.clone(),
        source,
    })?;

    let mut installed = Vec::new();
    let mut skipped = Vec::new();

    for archive in archives {
        let outcome = match install_archive(&root, archive, bundle_type) {
            Ok(outcome) => outcome,
            Err(e) => {
                // A leftover node_modules would short-circuit install_if_needed
                if fresh {
                    roll_back(&root, &installed);
                }
                return Err(e.into());
            }
        };
        match outcome {
            Outcome::Installed(package) => {
                log::debug!("Installed {} from {}", package.name, archive.display());
                installed.push(package);
            }
            Outcome::Skipped(reason) => skipped.push(SkippedArchive {
                archive: archive.clone(),
                reason,
            }),
        }
    }

    Ok(InstallReport {
        root,
        installed,
        skipped,
    })
}

/// Removes `node_modules` and the staging dirs of `installed`.
fn roll_back(root: &Path, installed: &[InstalledPackage]) {
    let staged = installed
        .iter()
        .filter_map(|package| staging_dir(root, &package.archive));
    for dir in std::iter::once(root.join("node_modules")).chain(staged) {
        if let Err(e) = remove_dir_all_blocking(&dir) {
            log::warn!("Failed to roll back {}: {}", dir.display(), e);
        }
    }
}

/// `<root>/tmp/<file stem>`
fn staging_dir(root: &Path, archive: &Path) -> Option<PathBuf> {
    archive
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .map(|stem| root.join("tmp").join(stem))
}

fn install_archive(root: &Path, archive: &Path, bundle_type: BundleType) -> std::result::Result<Outcome, InstallError> {
    let staging = staging_dir(root, archive)
        .ok_or_else(|| InstallError::InvalidArchive(archive.to_path_buf()))?;

    if staging.is_dir() {
        log::debug!("{} already staged at {}", archive.display(), staging.display());
        return Ok(Outcome::Skipped(Skip::AlreadyStaged));
    }

    unzip::unzip(archive, &staging)?;

    // A failed archive must not look staged on the next call
    place_package(root, archive, &staging, bundle_type).inspect_err(|_| {
        if let Err(cleanup) = remove_dir_all_blocking(&staging) {
            log::warn!(
                "Failed to remove staging dir {}: {}",
                staging.display(),
                cleanup
            );
        }
    })
}

/// Moves the package found in `staging` into `node_modules`.
fn place_package(
    root: &Path,
    archive: &Path,
    staging: &Path,
    bundle_type: BundleType,
) -> std::result::Result<Outcome, InstallError> {
    let search_root = staging.join(bundle_type.manifest_prefix());
    let Some(manifest_path) = metadata::find_manifest(&search_root) else {
        log::info!("package.json not found in package {}", archive.display());
        return Ok(Outcome::Skipped(Skip::ManifestNotFound));
    };
    let manifest = metadata::load_manifest(&manifest_path)?;

    let target = root.join("node_modules").join(&manifest.name);
    if target.exists() {
        log::info!(
            "skipping package {} as it already exists in {}",
            manifest.name,
            target.display()
        );
        return Ok(Outcome::Skipped(Skip::PackageExists {
            name: manifest.name,
        }));
    }

    let package_dir = manifest_path
        .parent()
        .ok_or_else(|| InstallError::InvalidArchive(archive.to_path_buf()))?;
    move_dir_blocking(package_dir, &target).map_err(|e| InstallError::Move {
        source_dir: package_dir.to_path_buf(),
        target: target.clone(),
        reason: e.to_string(),
    })?;

    Ok(Outcome::Installed(InstalledPackage {
        name: manifest.name,
        archive: archive.to_path_buf(),
        path: target,
    }))
}
