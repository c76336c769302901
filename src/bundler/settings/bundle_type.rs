//! Archive packaging conventions.

/// Packaging convention of a batch of dependency archives.
///
/// Both conventions are plain zip archives that embed an npm package
/// (`package.json` plus sources) under a fixed prefix.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_esbuild::bundler::BundleType;
///
/// assert_eq!(BundleType::Mvnpm.manifest_prefix(), "META-INF/resources/_static");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// Classic webjars: `META-INF/resources/webjars/<name>/<version>/package.json`
    Webjar,
    /// mvnpm jars: `META-INF/resources/_static/<name>/package.json`
    #[default]
    Mvnpm,
}

/// Manifest search prefix for each convention.
const MANIFEST_PREFIXES: [(BundleType, &str); 2] = [
    (BundleType::Webjar, "META-INF/resources/webjars"),
    (BundleType::Mvnpm, "META-INF/resources/_static"),
];

impl BundleType {
    /// Path prefix inside an extracted archive under which `package.json` lives.
    pub fn manifest_prefix(self) -> &'static str {
        MANIFEST_PREFIXES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, prefix)| *prefix)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for BundleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Webjar => f.write_str("webjar"),
            Self::Mvnpm => f.write_str("mvnpm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_prefix() {
        assert_eq!(BundleType::Webjar.manifest_prefix(), "META-INF/resources/webjars");
        assert_eq!(BundleType::Mvnpm.manifest_prefix(), "META-INF/resources/_static");
    }
}
