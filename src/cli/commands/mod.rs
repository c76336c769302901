//! Command execution for bundler operations.
//!
//! Settings are merged in increasing precedence: built-in defaults, the
//! project file, then command line flags and `ESBUILD_*` environment
//! variables.

mod build;
mod deps;
mod resolve;

use super::args::{Args, BuildArgs, Command};
use super::project::ProjectFile;
use super::RuntimeConfig;
use crate::bundler::{BundleOptions, BundleOptionsBuilder, BundlerConfig, Entry, EventFormat};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runs the parsed command.
pub async fn execute(args: &Args, runtime: &RuntimeConfig) -> Result<()> {
    let project = match &args.config {
        Some(path) => {
            runtime.verbose(&format!("Loading project file {}", path.display()))?;
            ProjectFile::load(path)?
        }
        None => ProjectFile::default(),
    };

    match &args.command {
        Command::Bundle(build) => {
            let config = bundler_config(args, &project, None);
            build::bundle(config, &project, build, runtime).await
        }
        Command::Watch(watch) => {
            let config = bundler_config(args, &project, watch.event_format);
            build::watch(config, &project, &watch.build, runtime).await
        }
        Command::Install(install) => {
            let config = bundler_config(args, &project, None);
            deps::install(config, &project, install, runtime).await
        }
        Command::Clear { work_dir } => {
            let config = bundler_config(args, &project, None);
            deps::clear(config, &project, work_dir.as_deref(), runtime).await
        }
        Command::Resolve { version } => {
            let config = bundler_config(args, &project, None);
            resolve::resolve(config, version.as_deref(), runtime).await
        }
    }
}

/// Layers project and command line settings over the defaults.
fn bundler_config(args: &Args, project: &ProjectFile, event_format: Option<EventFormat>) -> BundlerConfig {
    let section = &project.bundler;
    let mut config = BundlerConfig::default();

    if let Some(version) = args.esbuild_version.as_ref().or(section.esbuild_version.as_ref()) {
        config = config.with_esbuild_version(version.trim());
    }
    if let Some(executable) = args.esbuild_binary.as_ref().or(section.executable.as_ref()) {
        config = config.with_executable(executable);
    }
    if let Some(registry) = args.registry.as_ref().or(section.registry_url.as_ref()) {
        config = config.with_registry_url(registry.as_str());
    }
    if let Some(dir) = args.cache_dir.as_ref().or(section.cache_dir.as_ref()) {
        config = config.with_cache_dir(dir);
    }
    if let Some(dir) = args.archive_dir.as_ref().or(section.archive_dir.as_ref()) {
        config = config.with_archive_dir(dir);
    }
    if let Some(format) = event_format.or(section.event_format) {
        config = config.with_event_format(format);
    }
    if let Some(secs) = section.run_timeout_secs {
        config = config.with_run_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = section.stop_grace_secs {
        config = config.with_stop_grace(Duration::from_secs(secs));
    }

    config
}

/// Command line paths are relative to the current directory, not the work
/// directory.
fn from_cwd(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Builds bundle options from the project file and `bundle`/`watch` flags.
fn bundle_options(project: &ProjectFile, build: &BuildArgs) -> Result<BundleOptions> {
    let dependencies = if build.dependencies.is_empty() {
        project.dependencies.clone()
    } else {
        build.dependencies.clone()
    };

    let entries = if build.entries.is_empty() {
        project.entries.clone()
    } else {
        build
            .entries
            .iter()
            .map(|path| from_cwd(path).map(Entry::File))
            .collect::<Result<Vec<_>>>()?
    };

    let mut esbuild = project.esbuild.clone();
    if let Some(format) = build.format {
        esbuild.format = format;
    }
    if let Some(platform) = build.platform {
        esbuild.platform = Some(platform);
    }
    if let Some(target) = &build.target {
        esbuild.target = Some(target.clone());
    }
    esbuild.minify &= !build.no_minify;
    esbuild.sourcemap &= !build.no_sourcemap;
    esbuild.splitting &= !build.no_splitting;
    esbuild.external.extend(build.externals.iter().cloned());

    let mut builder = BundleOptionsBuilder::new()
        .dependencies(dependencies)
        .entries(entries)
        .esbuild_config(esbuild);
    if let Some(bundle_type) = build.bundle_type.or(project.bundle_type) {
        builder = builder.bundle_type(bundle_type);
    }
    if let Some(work_dir) = build.work_dir.as_ref().or(project.work_dir.as_ref()) {
        builder = builder.work_dir(work_dir);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BundleType, Format};

    fn project() -> ProjectFile {
        ProjectFile {
            dependencies: vec![PathBuf::from("/p/a.jar")],
            entries: vec![Entry::file("/p/app.js")],
            bundle_type: Some(BundleType::Webjar),
            ..Default::default()
        }
    }

    #[test]
    fn project_values_fill_missing_flags() {
        let options = bundle_options(&project(), &BuildArgs::default()).unwrap();
        assert_eq!(options.dependencies(), &[PathBuf::from("/p/a.jar")]);
        assert_eq!(options.bundle_type(), BundleType::Webjar);
        assert_eq!(options.entries(), &[Entry::file("/p/app.js")]);
        assert!(options.esbuild_config().minify);
    }

    #[test]
    fn flags_override_project_values() {
        let build = BuildArgs {
            dependencies: vec![PathBuf::from("/cli/b.jar")],
            bundle_type: Some(BundleType::Mvnpm),
            format: Some(Format::Cjs),
            no_minify: true,
            externals: vec!["react".into()],
            ..Default::default()
        };
        let options = bundle_options(&project(), &build).unwrap();
        assert_eq!(options.dependencies(), &[PathBuf::from("/cli/b.jar")]);
        assert_eq!(options.bundle_type(), BundleType::Mvnpm);
        assert_eq!(options.esbuild_config().format, Format::Cjs);
        assert!(!options.esbuild_config().minify);
        assert_eq!(options.esbuild_config().external, vec!["react".to_string()]);
    }

    #[test]
    fn missing_entries_are_rejected() {
        assert!(bundle_options(&ProjectFile::default(), &BuildArgs::default()).is_err());
    }
}
