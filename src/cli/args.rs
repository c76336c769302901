//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation of
//! cross-argument constraints that clap cannot express.

use crate::bundler::{BundleType, EventFormat, Format, Platform};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Webjar/mvnpm esbuild bundler
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_esbuild",
    version,
    about = "Bundles webjar and mvnpm dependencies with esbuild",
    long_about = "Stages webjar/mvnpm archives into node_modules and runs a version-pinned esbuild.

Usage:
  kodegen_bundler_esbuild bundle --dependency lib/lit-3.1.0.jar --entry src/app.js
  kodegen_bundler_esbuild --config bundle.toml watch
  kodegen_bundler_esbuild resolve 0.19.9

The esbuild binary is downloaded once per version into the cache directory."
)]
pub struct Args {
    /// Project file (TOML) providing defaults for all options
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// esbuild version to run
    #[arg(long, global = true, env = "ESBUILD_VERSION", value_name = "VERSION")]
    pub esbuild_version: Option<String>,

    /// Run this esbuild executable instead of a cached download
    #[arg(long, global = true, env = "ESBUILD_BINARY", value_name = "PATH")]
    pub esbuild_binary: Option<PathBuf>,

    /// npm registry serving @esbuild packages
    #[arg(long, global = true, env = "ESBUILD_REGISTRY", value_name = "URL")]
    pub registry: Option<String>,

    /// Executable cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding pre-fetched <classifier>-<version>.tgz archives
    #[arg(long, global = true, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Show detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors and requested values
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install dependencies and run esbuild once
    Bundle(BuildArgs),

    /// Install dependencies and rebuild on change until interrupted
    Watch(WatchArgs),

    /// Install dependency archives into a work directory
    Install(InstallArgs),

    /// Remove a work directory's node_modules
    Clear {
        /// Work directory
        #[arg(short, long, value_name = "DIR")]
        work_dir: Option<PathBuf>,
    },

    /// Print the path of the esbuild executable, downloading it if needed
    Resolve {
        /// Version (defaults to the configured version)
        version: Option<String>,
    },
}

/// Options shared by `bundle` and `watch`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Dependency archive (repeatable)
    #[arg(short, long = "dependency", value_name = "ARCHIVE")]
    pub dependencies: Vec<PathBuf>,

    /// Packaging convention of the dependency archives
    #[arg(short = 't', long = "type", value_enum, value_name = "TYPE")]
    pub bundle_type: Option<BundleType>,

    /// Entry point file (repeatable)
    #[arg(short, long = "entry", value_name = "FILE")]
    pub entries: Vec<PathBuf>,

    /// Work directory (defaults to a fresh temporary directory)
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Output module format
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Target platform
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Language target, e.g. es2020
    #[arg(long)]
    pub target: Option<String>,

    /// Do not minify output
    #[arg(long)]
    pub no_minify: bool,

    /// Do not emit source maps
    #[arg(long)]
    pub no_sourcemap: bool,

    /// Do not split shared chunks
    #[arg(long)]
    pub no_splitting: bool,

    /// Module left external (repeatable)
    #[arg(long = "external", value_name = "MODULE")]
    pub externals: Vec<String>,
}

/// Options of `watch`
#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// How esbuild's watch output is decoded
    #[arg(long, value_enum)]
    pub event_format: Option<EventFormat>,
}

/// Options of `install`
#[derive(clap::Args, Debug, Clone)]
pub struct InstallArgs {
    /// Work directory (defaults to a fresh temporary directory)
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Packaging convention of the dependency archives
    #[arg(short = 't', long = "type", value_enum, value_name = "TYPE")]
    pub bundle_type: Option<BundleType>,

    /// Dependency archives
    #[arg(value_name = "ARCHIVE")]
    pub dependencies: Vec<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(version) = &self.esbuild_version {
            if version.trim().is_empty() {
                return Err("esbuild version cannot be empty".to_string());
            }
        }

        if let Some(config) = &self.config {
            if !config.is_file() {
                return Err(format!("Project file not found: {}", config.display()));
            }
        }

        if let Some(binary) = &self.esbuild_binary {
            if !binary.is_file() {
                return Err(format!("esbuild binary not found: {}", binary.display()));
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(args.verbose, args.quiet);
        let output = if args.no_color { output.plain() } else { output };

        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print error message
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }

    /// Print a requested value, even when quiet
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        self.output.println(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn bundle_arguments_parse() {
        let args = Args::try_parse_from([
            "kodegen_bundler_esbuild",
            "bundle",
            "-d",
            "a.jar",
            "--dependency",
            "b.jar",
            "--type",
            "webjar",
            "--entry",
            "app.js",
            "--format",
            "iife",
            "--no-minify",
        ])
        .unwrap();

        let Command::Bundle(build) = args.command else {
            panic!("expected bundle");
        };
        assert_eq!(build.dependencies, vec![PathBuf::from("a.jar"), PathBuf::from("b.jar")]);
        assert_eq!(build.bundle_type, Some(BundleType::Webjar));
        assert_eq!(build.format, Some(Format::Iife));
        assert!(build.no_minify);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "kodegen_bundler_esbuild",
            "resolve",
            "--esbuild-version",
            "0.20.0",
            "--cache-dir",
            "/tmp/c",
        ])
        .unwrap();
        assert_eq!(args.esbuild_version.as_deref(), Some("0.20.0"));
        assert!(matches!(args.command, Command::Resolve { version: None }));
    }

    #[test]
    fn watch_accepts_event_format() {
        let args = Args::try_parse_from([
            "kodegen_bundler_esbuild",
            "watch",
            "--event-format",
            "json-lines",
            "-e",
            "app.js",
        ])
        .unwrap();
        let Command::Watch(watch) = args.command else {
            panic!("expected watch");
        };
        assert_eq!(watch.event_format, Some(EventFormat::JsonLines));
        assert_eq!(watch.build.entries, vec![PathBuf::from("app.js")]);
    }
}
