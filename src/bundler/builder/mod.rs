//! Bundle orchestration.
//!
//! [`Bundler`] composes the dependency installer, the executable cache and
//! the process supervisor into `bundle` and `watch` calls.

mod orchestrator;

pub use orchestrator::{BundleResult, Bundler};
