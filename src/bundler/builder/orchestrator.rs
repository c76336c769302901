//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that installs dependency
//! archives, prepares the output directory and entry points, and drives the
//! esbuild executable.

use crate::bundler::{
    Result,
    error::{ErrorExt, ExecutionError},
    executable::ExecutableCache,
    install::{DependencyInstaller, InstallReport},
    process::{BuildEventListener, ExecuteResult, ProcessSupervisor},
    settings::{BundleOptions, BundleType, BundlerConfig, Entry, EsBuildConfig},
    utils::fs,
    watch::WatchSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const NODE_MODULES: &str = "node_modules";
const DIST: &str = "dist";

/// Orchestration stages, logged on every transition.
#[derive(Clone, Copy, Debug)]
enum Stage {
    Install,
    Configure,
    Execute,
    Launch,
    Running,
    Done,
    Failed,
}

fn transition(from: Stage, to: Stage) {
    log::debug!("{:?} -> {:?}", from, to);
}

/// Output of a successful one-shot bundle.
#[derive(Debug, Clone)]
pub struct BundleResult {
    dist: PathBuf,
    result: ExecuteResult,
}

impl BundleResult {
    /// Output directory, `<work_dir>/dist`.
    pub fn dist(&self) -> &Path {
        &self.dist
    }

    /// Dependency root the bundle was built in.
    pub fn work_dir(&self) -> &Path {
        self.dist.parent().unwrap_or(&self.dist)
    }

    /// Exit status and captured output of the esbuild run.
    pub fn execution(&self) -> &ExecuteResult {
        &self.result
    }

    /// Captured esbuild output.
    pub fn output(&self) -> &str {
        self.result.output()
    }
}

/// Main bundler orchestrator.
///
/// Every call runs `install -> configure -> execute` (one-shot) or
/// `install -> configure -> launch` (watch). Installation is skipped when the
/// caller's work directory already has a `node_modules` tree.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_esbuild::bundler::{
///     BundleOptionsBuilder, BundleType, Bundler, BundlerConfig, Entry,
/// };
///
/// # async fn example() -> kodegen_bundler_esbuild::bundler::Result<()> {
/// let bundler = Bundler::new(BundlerConfig::default());
/// let options = BundleOptionsBuilder::new()
///     .bundle_type(BundleType::Mvnpm)
///     .dependency("lib/lit-3.1.0.jar")
///     .entry(Entry::file("/src/app.js"))
///     .build()?;
///
/// let result = bundler.bundle(&options).await?;
/// println!("Bundled into {}", result.dist().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Bundler {
    config: BundlerConfig,
    cache: Arc<ExecutableCache>,
}

impl Bundler {
    /// Creates a bundler with its own executable cache.
    pub fn new(config: BundlerConfig) -> Self {
        let cache = Arc::new(ExecutableCache::from_config(&config));
        Self { config, cache }
    }

    /// Creates a bundler sharing an existing executable cache.
    pub fn with_cache(config: BundlerConfig, cache: Arc<ExecutableCache>) -> Self {
        Self { config, cache }
    }

    /// Construction-time configuration.
    pub fn config(&self) -> &BundlerConfig {
        &self.config
    }

    /// Shared executable cache.
    pub fn cache(&self) -> &Arc<ExecutableCache> {
        &self.cache
    }

    /// Path of the esbuild executable this bundler runs.
    ///
    /// The configured override wins; otherwise the pinned version is resolved
    /// through the cache.
    pub async fn executable(&self) -> Result<PathBuf> {
        if let Some(executable) = self.config.executable() {
            return Ok(executable.to_path_buf());
        }
        Ok(self.cache.resolve(self.config.esbuild_version()).await?)
    }

    /// Installs `dependencies` into `work_dir`, or into a fresh temporary
    /// directory when none is given.
    pub async fn install(
        &self,
        work_dir: Option<&Path>,
        dependencies: &[PathBuf],
        bundle_type: BundleType,
    ) -> Result<InstallReport> {
        let root = match work_dir {
            Some(dir) => absolute(dir)?,
            None => temporary_work_dir(),
        };
        fs::create_dir_all(&root, false).await?;

        let report = DependencyInstaller::new(&root)
            .install(dependencies, bundle_type)
            .await?;
        log::debug!(
            "Installed {} packages into {} ({} skipped)",
            report.installed().len(),
            root.display(),
            report.skipped().len()
        );
        Ok(report)
    }

    /// Removes `<work_dir>/node_modules`.
    pub async fn clear_dependencies(&self, work_dir: &Path) -> Result<()> {
        DependencyInstaller::new(work_dir).clear().await
    }

    /// Returns the dependency root for `options`, installing only when the
    /// caller's work directory has no `node_modules` yet.
    pub async fn install_if_needed(&self, options: &BundleOptions) -> Result<PathBuf> {
        if let Some(work_dir) = options.work_dir() {
            let work_dir = absolute(work_dir)?;
            if work_dir.join(NODE_MODULES).is_dir() {
                log::debug!("{} already has {}, skipping install", work_dir.display(), NODE_MODULES);
                return Ok(work_dir);
            }
        }

        let report = self
            .install(options.work_dir(), options.dependencies(), options.bundle_type())
            .await?;
        Ok(report.root().to_path_buf())
    }

    /// Runs esbuild once and returns the output directory.
    ///
    /// # Errors
    ///
    /// Fails when dependencies cannot be installed, esbuild cannot be
    /// resolved or run, or no output directory exists after the run (the
    /// error then carries esbuild's output).
    pub async fn bundle(&self, options: &BundleOptions) -> Result<BundleResult> {
        let work_dir = self.install_if_needed(options).await?;
        transition(Stage::Install, Stage::Configure);

        let (dist, config) = configure(&work_dir, options, false).await?;
        transition(Stage::Configure, Stage::Execute);

        let supervisor = self.supervisor(&work_dir).await?;
        let result = match supervisor.run_once(&config).await {
            Ok(result) => result,
            Err(e) => {
                transition(Stage::Execute, Stage::Failed);
                return Err(e.into());
            }
        };

        if !dist.is_dir() {
            transition(Stage::Execute, Stage::Failed);
            return Err(ExecutionError::MissingOutput {
                dist,
                output: result.output().to_string(),
            }
            .into());
        }

        transition(Stage::Execute, Stage::Done);
        log::info!("Bundled into {}", dist.display());
        Ok(BundleResult { dist, result })
    }

    /// Starts esbuild in watch mode; `listener` receives one event per
    /// rebuild.
    pub async fn watch<L: BuildEventListener>(&self, options: &BundleOptions, listener: L) -> Result<WatchSession> {
        let work_dir = self.install_if_needed(options).await?;
        transition(Stage::Install, Stage::Configure);

        let (_dist, config) = configure(&work_dir, options, true).await?;
        transition(Stage::Configure, Stage::Launch);

        let supervisor = self.supervisor(&work_dir).await?;
        let process = match supervisor.run_watched(&config, listener) {
            Ok(process) => process,
            Err(e) => {
                transition(Stage::Launch, Stage::Failed);
                return Err(e.into());
            }
        };

        transition(Stage::Launch, Stage::Running);
        Ok(WatchSession::new(process, work_dir).with_stop_grace(self.config.stop_grace()))
    }

    async fn supervisor(&self, work_dir: &Path) -> Result<ProcessSupervisor> {
        let executable = self.executable().await?;
        Ok(ProcessSupervisor::new(executable, work_dir)
            .with_run_timeout(self.config.run_timeout())
            .with_event_format(self.config.event_format()))
    }
}

/// Empties `<work_dir>/dist` and builds the esbuild settings for this call.
async fn configure(work_dir: &Path, options: &BundleOptions, watch: bool) -> Result<(PathBuf, EsBuildConfig)> {
    let entry_points = Entry::process_all(options.entries(), work_dir).await?;

    let dist = work_dir.join(DIST);
    fs::create_dir_all(&dist, true).await?;

    let mut config = options.esbuild_config().clone();
    config.outdir = Some(dist.clone());
    config.entry_points = entry_points;
    config.watch = watch;
    Ok((dist, config))
}

/// Entries and `--outdir` are joined onto the work dir, and esbuild runs
/// inside it, so it must not be relative.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).fs_context("resolving work directory", path)
}

fn temporary_work_dir() -> PathBuf {
    std::env::temp_dir().join(format!("bundle-{}", uuid::Uuid::new_v4()))
}
