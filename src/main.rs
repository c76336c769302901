//! Kodegen Bundler esbuild - webjar/mvnpm bundling with esbuild.
//!
//! This binary installs dependency archives into node_modules and runs a
//! version-pinned esbuild, once or in watch mode.

use kodegen_bundler_esbuild::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
