//! esbuild invocation settings and their command-line translation.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output module format (`--format`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Immediately-invoked function expression
    Iife,
    /// CommonJS
    Cjs,
    /// ECMAScript modules
    #[default]
    Esm,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Self::Iife => "iife",
            Self::Cjs => "cjs",
            Self::Esm => "esm",
        }
    }
}

/// Target platform (`--platform`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser globals, browser field resolution
    Browser,
    /// Node.js built-ins are external
    Node,
    /// No platform assumptions
    Neutral,
}

impl Platform {
    fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Node => "node",
            Self::Neutral => "neutral",
        }
    }
}

/// Content loader for a file extension (`--loader:.ext=`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Css,
    Json,
    Text,
    Base64,
    File,
    #[serde(rename = "dataurl")]
    DataUrl,
    Binary,
    Copy,
    Empty,
}

impl Loader {
    fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Jsx => "jsx",
            Self::Ts => "ts",
            Self::Tsx => "tsx",
            Self::Css => "css",
            Self::Json => "json",
            Self::Text => "text",
            Self::Base64 => "base64",
            Self::File => "file",
            Self::DataUrl => "dataurl",
            Self::Binary => "binary",
            Self::Copy => "copy",
            Self::Empty => "empty",
        }
    }
}

/// Settings passed to the esbuild executable.
///
/// `outdir`, `entry_points` and `watch` are owned by the orchestrator and
/// overwritten on every bundle or watch call; everything else is passed
/// through as-is.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_esbuild::bundler::EsBuildConfig;
///
/// let config = EsBuildConfig {
///     minify: false,
///     ..Default::default()
/// };
/// assert!(config.to_args().contains(&"--bundle".to_string()));
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct EsBuildConfig {
    /// Inline imported dependencies (`--bundle`).
    pub bundle: bool,

    /// Minify output (`--minify`).
    pub minify: bool,

    /// Emit source maps (`--sourcemap`).
    pub sourcemap: bool,

    /// Code splitting for shared chunks (`--splitting`, ESM only).
    pub splitting: bool,

    /// Output format.
    pub format: Format,

    /// Target platform.
    ///
    /// Default: None (esbuild's own default, `browser`)
    pub platform: Option<Platform>,

    /// Language target, e.g. `es2020`.
    pub target: Option<String>,

    /// Entry file naming template.
    pub entry_names: Option<String>,

    /// Chunk file naming template.
    pub chunk_names: Option<String>,

    /// Asset file naming template.
    pub asset_names: Option<String>,

    /// Loader per file extension (keys include the dot, e.g. `.svg`).
    pub loaders: BTreeMap<String, Loader>,

    /// Module names left external.
    pub external: Vec<String>,

    /// Compile-time substitutions.
    pub define: BTreeMap<String, String>,

    /// Public path prefix for `file` loader URLs.
    pub public_path: Option<String>,

    /// Resolve symlinks to their link path instead of their target.
    pub preserve_symlinks: bool,

    /// Raw arguments appended verbatim.
    pub extra_args: Vec<String>,

    /// Output directory (`--outdir`). Set by the orchestrator.
    #[serde(skip)]
    pub outdir: Option<PathBuf>,

    /// Entry point files. Set by the orchestrator.
    #[serde(skip)]
    pub entry_points: Vec<PathBuf>,

    /// Keep rebuilding on change (`--watch=forever`). Set by the orchestrator.
    #[serde(skip)]
    pub watch: bool,
}

impl Default for EsBuildConfig {
    fn default() -> Self {
        let loaders = [
            (".svg", Loader::File),
            (".gif", Loader::File),
            (".png", Loader::File),
            (".jpg", Loader::File),
            (".woff", Loader::File),
            (".woff2", Loader::File),
            (".ttf", Loader::File),
            (".eot", Loader::File),
        ]
        .into_iter()
        .map(|(ext, loader)| (ext.to_string(), loader))
        .collect();

        Self {
            bundle: true,
            minify: true,
            sourcemap: true,
            splitting: true,
            format: Format::Esm,
            platform: None,
            target: None,
            entry_names: None,
            chunk_names: None,
            asset_names: None,
            loaders,
            external: Vec::new(),
            define: BTreeMap::new(),
            public_path: None,
            preserve_symlinks: false,
            extra_args: Vec::new(),
            outdir: None,
            entry_points: Vec::new(),
            watch: false,
        }
    }
}

impl EsBuildConfig {
    /// Translates the settings into esbuild command-line arguments.
    ///
    /// Flags come first, entry points last.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        let toggles = [
            (self.bundle, "--bundle"),
            (self.minify, "--minify"),
            (self.sourcemap, "--sourcemap"),
            (self.splitting, "--splitting"),
            (self.preserve_symlinks, "--preserve-symlinks"),
        ];
        args.extend(
            toggles
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        args.push(format!("--format={}", self.format.as_str()));
        if let Some(platform) = self.platform {
            args.push(format!("--platform={}", platform.as_str()));
        }

        let valued = [
            ("--target", &self.target),
            ("--entry-names", &self.entry_names),
            ("--chunk-names", &self.chunk_names),
            ("--asset-names", &self.asset_names),
            ("--public-path", &self.public_path),
        ];
        for (flag, value) in valued {
            if let Some(value) = value {
                args.push(format!("{flag}={value}"));
            }
        }

        for (ext, loader) in &self.loaders {
            args.push(format!("--loader:{}={}", ext, loader.as_str()));
        }
        for name in &self.external {
            args.push(format!("--external:{name}"));
        }
        for (key, value) in &self.define {
            args.push(format!("--define:{key}={value}"));
        }

        if let Some(outdir) = &self.outdir {
            args.push(format!("--outdir={}", outdir.display()));
        }
        if self.watch {
            args.push("--watch=forever".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args.extend(
            self.entry_points
                .iter()
                .map(|entry| entry.display().to_string()),
        );

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_produces_bundle_flags() {
        let args = EsBuildConfig::default().to_args();
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--splitting".to_string()));
        assert!(args.contains(&"--format=esm".to_string()));
        assert!(args.contains(&"--loader:.svg=file".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--watch")));
    }

    #[test]
    fn outdir_watch_and_entries_are_emitted_last() {
        let config = EsBuildConfig {
            outdir: Some(PathBuf::from("/work/dist")),
            entry_points: vec![PathBuf::from("/work/index.js")],
            watch: true,
            extra_args: vec!["--log-level=info".into()],
            ..Default::default()
        };
        let args = config.to_args();
        let n = args.len();
        assert_eq!(args[n - 1], "/work/index.js");
        assert_eq!(args[n - 2], "--log-level=info");
        assert_eq!(args[n - 3], "--watch=forever");
        assert_eq!(args[n - 4], "--outdir=/work/dist");
    }

    #[test]
    fn disabled_toggles_are_omitted() {
        let config = EsBuildConfig {
            bundle: false,
            minify: false,
            sourcemap: false,
            splitting: false,
            format: Format::Iife,
            platform: Some(Platform::Node),
            external: vec!["react".into()],
            define: [("DEBUG".to_string(), "false".to_string())].into(),
            loaders: BTreeMap::new(),
            ..Default::default()
        };
        assert_eq!(
            config.to_args(),
            vec![
                "--format=iife",
                "--platform=node",
                "--external:react",
                "--define:DEBUG=false",
            ]
        );
    }

    #[test]
    fn deserializes_from_toml_with_defaults() {
        let config: EsBuildConfig = toml::from_str(
            r#"
            minify = false
            format = "cjs"
            platform = "neutral"
            [loaders]
            ".txt" = "text"
            ".png" = "dataurl"
            "#,
        )
        .unwrap();
        assert!(config.bundle);
        assert!(!config.minify);
        assert_eq!(config.format, Format::Cjs);
        assert_eq!(config.platform, Some(Platform::Neutral));
        assert_eq!(config.loaders.get(".png"), Some(&Loader::DataUrl));
        assert!(config.outdir.is_none());
    }
}
