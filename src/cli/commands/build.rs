//! `bundle` and `watch` commands.

use super::bundle_options;
use crate::bundler::{BuildEvent, Bundler, BundlerConfig, WatchEvent};
use crate::cli::args::BuildArgs;
use crate::cli::output::OutputManager;
use crate::cli::project::ProjectFile;
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Installs dependencies and runs esbuild once.
pub async fn bundle(config: BundlerConfig, project: &ProjectFile, build: &BuildArgs, runtime: &RuntimeConfig) -> Result<()> {
    let options = bundle_options(project, build)?;
    let bundler = Bundler::new(config);

    runtime.section("Bundling")?;
    runtime.progress(&format!(
        "Installing {} {} dependencies",
        options.dependencies().len(),
        options.bundle_type()
    ))?;

    let result = bundler.bundle(&options).await?;
    for line in result.output().lines() {
        runtime.verbose(line)?;
    }

    if !result.execution().success() {
        runtime.warn(&format!("esbuild exited with {}", result.execution().status()))?;
    }
    runtime.success(&format!("Bundled into {}", result.dist().display()))?;
    Ok(())
}

/// Installs dependencies and rebuilds on change until Ctrl-C.
pub async fn watch(config: BundlerConfig, project: &ProjectFile, build: &BuildArgs, runtime: &RuntimeConfig) -> Result<()> {
    let options = bundle_options(project, build)?;
    let bundler = Bundler::new(config);

    runtime.section("Watching")?;
    let output = runtime.output().clone();
    let mut session = bundler
        .watch(&options, move |event: WatchEvent| report(&output, event))
        .await?;
    runtime.progress(&format!(
        "Output in {} (Ctrl-C to stop)",
        session.dist().display()
    ))?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        exited = session.wait() => {
            if let Some(status) = exited? {
                runtime.warn(&format!("esbuild exited unexpectedly with {}", status))?;
            }
        }
    }

    if let Some(status) = session.stop().await? {
        runtime.verbose(&format!("esbuild stopped ({})", status))?;
    }
    runtime.success("Watch stopped")?;
    Ok(())
}

fn report(output: &OutputManager, event: WatchEvent) -> anyhow::Result<()> {
    match event {
        WatchEvent::Build(build) => report_build(output, &build)?,
        WatchEvent::Malformed(e) => output.warn(&format!("Ignoring build event: {}", e))?,
    }
    Ok(())
}

fn report_build(output: &OutputManager, build: &BuildEvent) -> std::io::Result<()> {
    for warning in &build.warnings {
        output.warn(&warning.to_string())?;
    }
    if build.is_success() {
        return output.success("Build succeeded");
    }

    output.error(&format!("Build failed with {} error(s)", build.problems().len()))?;
    for problem in build.problems() {
        output.indent(&problem.to_string())?;
    }
    Ok(())
}
