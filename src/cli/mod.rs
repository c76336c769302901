//! Command line interface for the esbuild bundler.
//!
//! This module provides argument parsing, project file loading, command
//! execution and colored user feedback.

mod args;
pub mod commands;
mod output;
mod project;

pub use args::{Args, BuildArgs, Command, InstallArgs, RuntimeConfig, WatchArgs};
pub use output::OutputManager;
pub use project::{BundlerSection, ProjectFile};

use crate::error::{BundlerError, CliError, Result};

/// Main CLI entry point
///
/// Returns the process exit code. Command failures are reported here with
/// recovery suggestions; only failures to write to the terminal escape.
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let runtime = create_runtime_config(&args);

    let outcome = match validate_args(&args) {
        Ok(()) => commands::execute(&args, &runtime).await,
        Err(reason) => Err(BundlerError::Cli(CliError::InvalidArguments { reason })),
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            runtime.error(&e.to_string())?;
            if e.is_recoverable() {
                for suggestion in e.recovery_suggestions() {
                    runtime.indent(&suggestion)?;
                }
            }
            Ok(if e.is_recoverable() { 1 } else { 2 })
        }
    }
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}

/// Create runtime configuration from arguments
pub fn create_runtime_config(args: &Args) -> RuntimeConfig {
    RuntimeConfig::from(args)
}
