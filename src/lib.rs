//! esbuild bundler for webjar and mvnpm dependencies
//!
//! This library stages webjar/mvnpm archives into a `node_modules` tree,
//! resolves a version-pinned esbuild executable from a shared cache, and runs
//! it once or in watch mode with decoded build events.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
