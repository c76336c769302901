//! esbuild bundling for webjar and mvnpm dependencies.
//!
//! This module stages dependency archives into a `node_modules` tree, resolves
//! a version-pinned esbuild executable and runs it once or in watch mode.
//!
//! # Module Organization
//!
//! - [`settings`] - Orchestrator configuration, bundle options and esbuild flags
//! - [`executable`] - Version-pinned executable cache
//! - [`install`] - Archive staging into `node_modules`
//! - [`process`] - Subprocess supervision and watch-mode event decoding
//! - [`watch`] - Watch session handle
//! - [`builder`] - The [`Bundler`] orchestrator
//! - [`utils`] - File system and HTTP helpers

pub mod builder;
pub mod error;
pub mod executable;
pub mod install;
pub mod process;
pub mod settings;
pub mod utils;
pub mod watch;

pub use builder::{BundleResult, Bundler};
pub use error::{
    Error, ExecutionError, InstallError, MalformedEventError, ResolutionError, Result,
};
pub use executable::{ExecutableCache, PlatformPackage};
pub use install::{DependencyInstaller, InstallReport, InstalledPackage, Skip, SkippedArchive};
pub use process::{
    BuildEvent, BuildEventListener, BuildOutcome, EventDecoder, EventFormat, ExecuteResult,
    Location, Problem, ProcessSupervisor, WatchEvent, WatchProcess,
};
pub use settings::{
    BundleOptions, BundleOptionsBuilder, BundleType, BundlerConfig, Entry, EsBuildConfig,
    Format, Loader, Platform, default_cache_dir, default_esbuild_version,
};
pub use watch::WatchSession;
