//! Configuration structures for bundling operations.
//!
//! This module provides the orchestrator configuration, per-call bundle
//! options with their builder, esbuild passthrough settings, entry points and
//! the archive packaging conventions.

mod builder;
mod bundle_type;
mod config;
mod entry;
mod esbuild;
mod options;

// Re-export all public types
pub use builder::BundleOptionsBuilder;
pub use bundle_type::BundleType;
pub use config::{
    BundlerConfig, DEFAULT_REGISTRY_URL, DEFAULT_RUN_TIMEOUT, DEFAULT_STOP_GRACE,
    default_cache_dir, default_esbuild_version,
};
pub use entry::Entry;
pub use esbuild::{EsBuildConfig, Format, Loader, Platform};
pub use options::BundleOptions;
