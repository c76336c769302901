//! HTTP utilities for fetching esbuild packages.

use crate::bundler::error::{Error, Result};

/// Downloads a file from a URL.
///
/// Returns the file contents as a byte vector. Non-success statuses are
/// errors.
pub async fn download(url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::GenericError(format!("Download failed: {}", e)))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to read response: {}", e)))?;

    Ok(bytes.to_vec())
}

/// Fetches and deserializes a JSON document.
pub async fn fetch_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T> {
    log::debug!("Fetching {}", url);

    reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::GenericError(format!("Request failed: {}", e)))?
        .json::<T>()
        .await
        .map_err(|e| Error::GenericError(format!("Invalid JSON from {}: {}", url, e)))
}
