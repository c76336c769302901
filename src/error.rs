//! Top-level error types for the esbuild bundler CLI and library.
//!
//! This module defines the errors surfaced to users with actionable messages.

use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Project file could not be loaded
    #[error("Failed to load project file {path}: {reason}")]
    ProjectFile {
        /// Path of the project file
        path: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::{Error, ExecutionError, ResolutionError};

        match self {
            Self::Bundler(Error::Resolution(ResolutionError::UnsupportedPlatform { .. })) => vec![
                "Point ESBUILD_BINARY at a locally built esbuild executable".to_string(),
            ],
            Self::Bundler(Error::Resolution(
                ResolutionError::Download { .. } | ResolutionError::ArchiveMissing { .. },
            )) => vec![
                "Check network access to the npm registry or set ESBUILD_REGISTRY to a mirror"
                    .to_string(),
                "Place <classifier>-<version>.tgz in the directory passed via --archive-dir"
                    .to_string(),
            ],
            Self::Bundler(Error::Install(_)) => vec![
                "Run the `clear` command to reset node_modules and retry".to_string(),
                "Remove the work directory's tmp/ folder if an archive changed".to_string(),
            ],
            Self::Bundler(Error::Execution(ExecutionError::MissingOutput { .. })) => vec![
                "Inspect the esbuild output above for configuration errors".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Cli(_))
    }
}
