//! `resolve` command.

use crate::bundler::{BundlerConfig, ExecutableCache};
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Prints the executable path for `version`, installing it on first use.
pub async fn resolve(config: BundlerConfig, version: Option<&str>, runtime: &RuntimeConfig) -> Result<()> {
    let version = version.unwrap_or(config.esbuild_version());

    let path = match config.executable() {
        Some(executable) => executable.to_path_buf(),
        None => {
            runtime.progress(&format!("Resolving esbuild {}", version))?;
            let cache = ExecutableCache::from_config(&config);
            cache.resolve(version).await.map_err(crate::bundler::Error::from)?
        }
    };

    runtime.println(&path.display().to_string())?;
    Ok(())
}
