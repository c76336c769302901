//! Error types for staging, executable resolution and esbuild supervision.
//!
//! Every component has its own error enum so callers can match on the stage
//! that failed. All of them fold into [`Error`], which the orchestrator
//! returns.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving the esbuild executable for a version.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// Version identifier was empty
    #[error("esbuild version must not be empty")]
    EmptyVersion,

    /// Host platform has no published esbuild binary
    #[error("unsupported platform for esbuild {version}: {os}/{arch}")]
    UnsupportedPlatform {
        /// Requested version
        version: String,
        /// `std::env::consts::OS`
        os: String,
        /// `std::env::consts::ARCH`
        arch: String,
    },

    /// No packaged archive could be located or fetched
    #[error("esbuild {version} archive not found: {reason}")]
    ArchiveMissing {
        /// Requested version
        version: String,
        /// Where we looked and why it failed
        reason: String,
    },

    /// Registry download failed
    #[error("failed to download esbuild {version} from {url}: {reason}")]
    Download {
        /// Requested version
        version: String,
        /// URL that failed
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// Archive digest did not match the registry metadata
    #[error("integrity check failed for esbuild {version}: expected {expected}, got {actual}")]
    Integrity {
        /// Requested version
        version: String,
        /// Digest announced by the registry
        expected: String,
        /// Digest of the downloaded bytes
        actual: String,
    },

    /// Binary payload could not be extracted or published
    #[error("failed to extract esbuild {version} into {path}: {reason}")]
    Extraction {
        /// Requested version
        version: String,
        /// Cache path involved
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// I/O failure around the cache directory
    #[error("esbuild cache I/O error for {version} at {path}: {source}")]
    Io {
        /// Requested version
        version: String,
        /// Cache path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while installing dependency archives into `node_modules`.
#[derive(Error, Debug)]
pub enum InstallError {
    /// Archive could not be unzipped into its staging directory
    #[error("failed to unzip {archive} into {staging}: {reason}")]
    Unzip {
        /// Archive being installed
        archive: PathBuf,
        /// Staging directory
        staging: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// `package.json` exists but could not be read or parsed
    #[error("failed to read package manifest {manifest}: {reason}")]
    Manifest {
        /// Manifest path
        manifest: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Package directory could not be moved into `node_modules`
    #[error("failed to move {source_dir} to {target}: {reason}")]
    Move {
        /// Package root inside the staging tree
        source_dir: PathBuf,
        /// Destination under `node_modules`
        target: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Archive path has no usable file name
    #[error("invalid dependency archive path: {0}")]
    InvalidArchive(PathBuf),

    /// Other filesystem failure inside the dependency root
    #[error("I/O error while {context} at {path}: {source}")]
    Io {
        /// Operation in progress
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while running the esbuild executable.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Process could not be started
    #[error("failed to spawn {executable}: {source}")]
    Spawn {
        /// Executable path
        executable: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the process failed
    #[error("failed to wait for {executable}: {source}")]
    Wait {
        /// Executable path
        executable: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Process exceeded the configured run timeout and was killed
    #[error("esbuild did not finish within {seconds}s\n{output}")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
        /// Output captured before the kill
        output: String,
    },

    /// Output directory is missing after a run
    #[error("unexpected error during bundling: output directory {dist} was not created\n{output}")]
    MissingOutput {
        /// Expected output directory
        dist: PathBuf,
        /// Captured combined output of the run
        output: String,
    },
}

impl ExecutionError {
    /// Captured subprocess output, when the failure carries any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Timeout { output, .. } | Self::MissingOutput { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// A watch-mode message that could not be decoded.
///
/// Delivered to listeners as a notification; never terminates a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed build event ({reason}): {payload}")]
pub struct MalformedEventError {
    /// Raw payload that failed to decode
    pub payload: String,
    /// Why decoding failed
    pub reason: String,
}

/// Main error type for bundler operations
#[derive(Error, Debug)]
pub enum Error {
    /// Executable resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Dependency installation failed
    #[error(transparent)]
    Install(#[from] InstallError),

    /// esbuild execution failed
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// I/O error with file context
    #[error("{context} {path}: {source}")]
    Fs {
        /// Operation in progress
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Plain I/O error
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// Background task failed to complete
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error message
    #[error("{0}")]
    GenericError(String),
}

/// Attach file context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps an I/O error with the operation and the path it touched.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Convert missing values and foreign errors into [`Error::GenericError`].
pub trait Context<T> {
    /// Replaces the failure with `msg`.
    fn context<C: std::fmt::Display>(self, msg: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context<C: std::fmt::Display>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
