//! `install` and `clear` commands.

use super::from_cwd;
use crate::bundler::{Bundler, BundlerConfig, Skip};
use crate::cli::args::InstallArgs;
use crate::cli::project::ProjectFile;
use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};
use std::path::Path;

/// Installs dependency archives and prints the dependency root.
pub async fn install(config: BundlerConfig, project: &ProjectFile, args: &InstallArgs, runtime: &RuntimeConfig) -> Result<()> {
    let dependencies = if args.dependencies.is_empty() {
        project.dependencies.clone()
    } else {
        args.dependencies.clone()
    };
    let bundle_type = args.bundle_type.or(project.bundle_type).unwrap_or_default();
    let work_dir = match args.work_dir.as_ref().or(project.work_dir.as_ref()) {
        Some(dir) => Some(from_cwd(dir)?),
        None => None,
    };

    runtime.progress(&format!(
        "Installing {} {} archives",
        dependencies.len(),
        bundle_type
    ))?;
    let report = Bundler::new(config)
        .install(work_dir.as_deref(), &dependencies, bundle_type)
        .await?;

    for package in report.installed() {
        runtime.indent(&format!("+ {}", package.name))?;
    }
    for skipped in report.skipped() {
        let reason = match &skipped.reason {
            Skip::AlreadyStaged => "already staged".to_string(),
            Skip::ManifestNotFound => "no package.json".to_string(),
            Skip::PackageExists { name } => format!("{} already installed", name),
        };
        runtime.verbose(&format!("  skipped {} ({})", skipped.archive.display(), reason))?;
    }

    runtime.success(&format!("Installed {} packages", report.installed().len()))?;
    runtime.println(&report.root().display().to_string())?;
    Ok(())
}

/// Removes the work directory's `node_modules`.
pub async fn clear(config: BundlerConfig, project: &ProjectFile, work_dir: Option<&Path>, runtime: &RuntimeConfig) -> Result<()> {
    let work_dir = work_dir
        .or(project.work_dir.as_deref())
        .ok_or_else(|| CliError::MissingArgument {
            argument: "--work-dir".to_string(),
        })?;

    Bundler::new(config).clear_dependencies(work_dir).await?;
    runtime.success(&format!("Cleared {}", work_dir.join("node_modules").display()))?;
    Ok(())
}
