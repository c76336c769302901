//! Host platform to npm package classifier mapping.

/// An esbuild binary package published as `@esbuild/<classifier>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlatformPackage {
    /// npm classifier, e.g. `linux-x64`
    pub classifier: &'static str,
    windows: bool,
}

/// `(std::env::consts::OS, std::env::consts::ARCH, classifier)`
const PACKAGES: &[(&str, &str, &str)] = &[
    ("linux", "x86_64", "linux-x64"),
    ("linux", "aarch64", "linux-arm64"),
    ("linux", "arm", "linux-arm"),
    ("linux", "x86", "linux-ia32"),
    ("linux", "riscv64", "linux-riscv64"),
    ("linux", "s390x", "linux-s390x"),
    ("linux", "loongarch64", "linux-loong64"),
    ("macos", "x86_64", "darwin-x64"),
    ("macos", "aarch64", "darwin-arm64"),
    ("windows", "x86_64", "win32-x64"),
    ("windows", "aarch64", "win32-arm64"),
    ("windows", "x86", "win32-ia32"),
    ("freebsd", "x86_64", "freebsd-x64"),
    ("freebsd", "aarch64", "freebsd-arm64"),
    ("openbsd", "x86_64", "openbsd-x64"),
    ("netbsd", "x86_64", "netbsd-x64"),
    ("android", "aarch64", "android-arm64"),
];

impl PlatformPackage {
    /// Package for the running host, if esbuild publishes one.
    pub fn host() -> Option<Self> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Package for an explicit OS/architecture pair.
    pub fn for_target(os: &str, arch: &str) -> Option<Self> {
        PACKAGES
            .iter()
            .find(|(o, a, _)| *o == os && *a == arch)
            .map(|(o, _, classifier)| Self {
                classifier,
                windows: *o == "windows",
            })
    }

    /// File name of the executable inside the cache.
    pub fn binary_name(&self) -> &'static str {
        if self.windows { "esbuild.exe" } else { "esbuild" }
    }

    /// Path of the executable inside the published tarball.
    pub fn archive_entry(&self) -> &'static str {
        if self.windows {
            "package/esbuild.exe"
        } else {
            "package/bin/esbuild"
        }
    }

    /// `<classifier>-<version>.tgz`, the local archive naming convention.
    pub fn archive_file_name(&self, version: &str) -> String {
        format!("{}-{}.tgz", self.classifier, version)
    }
}
