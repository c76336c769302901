//! Fetching esbuild packages from an npm registry.

use super::platform::PlatformPackage;
use crate::bundler::error::ResolutionError;
use crate::bundler::utils::http;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use sha2::Digest;

/// Version document returned by `GET <registry>/<package>/<version>`.
#[derive(Debug, Deserialize)]
struct VersionDocument {
    dist: Dist,
}

/// Tarball location and digests of a published version.
#[derive(Debug, Default, Deserialize)]
pub(super) struct Dist {
    pub tarball: String,
    /// Subresource integrity string, `sha512-<base64>`
    pub integrity: Option<String>,
    /// Hex sha1 of the tarball
    pub shasum: Option<String>,
}

/// Downloads the package tarball for `version`, verifying it against the
/// registry metadata when available.
pub(super) async fn fetch_tarball(
    registry: &str,
    package: PlatformPackage,
    version: &str,
) -> Result<Vec<u8>, ResolutionError> {
    let metadata_url = format!("{}/@esbuild/{}/{}", registry, package.classifier, version);
    let dist = match http::fetch_json::<VersionDocument>(&metadata_url).await {
        Ok(doc) => doc.dist,
        Err(e) => {
            log::warn!("No registry metadata for esbuild {version} ({e}), using tarball convention");
            Dist {
                tarball: conventional_tarball_url(registry, package, version),
                ..Default::default()
            }
        }
    };

    let bytes = http::download(&dist.tarball)
        .await
        .map_err(|e| ResolutionError::Download {
            version: version.to_string(),
            url: dist.tarball.clone(),
            reason: e.to_string(),
        })?;

    verify(version, &bytes, &dist)?;
    Ok(bytes)
}

/// `<registry>/@esbuild/<c>/-/<c>-<version>.tgz`
fn conventional_tarball_url(registry: &str, package: PlatformPackage, version: &str) -> String {
    format!(
        "{}/@esbuild/{}/-/{}",
        registry,
        package.classifier,
        package.archive_file_name(version)
    )
}

/// Checks the sha512 integrity, falling back to the sha1 shasum.
pub(super) fn verify(version: &str, bytes: &[u8], dist: &Dist) -> Result<(), ResolutionError> {
    let mismatch = |expected: &str, actual: String| ResolutionError::Integrity {
        version: version.to_string(),
        expected: expected.to_string(),
        actual,
    };

    if let Some(expected) = dist
        .integrity
        .as_deref()
        .and_then(|i| i.strip_prefix("sha512-"))
    {
        let actual = BASE64.encode(sha2::Sha512::digest(bytes));
        if actual != expected {
            return Err(mismatch(expected, actual));
        }
        log::debug!("sha512 integrity verified for esbuild {version}");
    } else if let Some(expected) = dist.shasum.as_deref() {
        let actual = hex::encode(sha1::Sha1::digest(bytes));
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(mismatch(expected, actual));
        }
        log::debug!("sha1 shasum verified for esbuild {version}");
    } else {
        log::debug!("registry published no digest for esbuild {version}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_integrity_is_checked() {
        let bytes = b"esbuild";
        let good = Dist {
            integrity: Some(format!("sha512-{}", BASE64.encode(sha2::Sha512::digest(bytes)))),
            ..Default::default()
        };
        verify("0.19.9", bytes, &good).unwrap();

        let bad = Dist {
            integrity: Some("sha512-AAAA".into()),
            ..Default::default()
        };
        assert!(matches!(
            verify("0.19.9", bytes, &bad),
            Err(ResolutionError::Integrity { .. })
        ));
    }

    #[test]
    fn shasum_is_used_without_integrity() {
        let bytes = b"esbuild";
        let dist = Dist {
            shasum: Some(hex::encode(sha1::Sha1::digest(bytes)).to_uppercase()),
            ..Default::default()
        };
        verify("0.19.9", bytes, &dist).unwrap();

        let bad = Dist {
            shasum: Some("00".into()),
            ..Default::default()
        };
        assert!(verify("0.19.9", bytes, &bad).is_err());
    }

    #[test]
    fn tarball_url_convention() {
        let pkg = PlatformPackage::for_target("linux", "x86_64").unwrap();
        assert_eq!(
            conventional_tarball_url("https://registry.npmjs.org", pkg, "0.19.9"),
            "https://registry.npmjs.org/@esbuild/linux-x64/-/linux-x64-0.19.9.tgz"
        );
    }
}
