//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::write::SimpleFileOptions;

/// Writes a jar embedding an npm package under `prefix`.
///
/// `files` are `(relative path, contents)` pairs placed next to the
/// generated `package.json`.
pub fn jar(dir: &Path, file_name: &str, prefix: &str, package: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(file_name);
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    let options = SimpleFileOptions::default();

    zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
    zip.write_all(b"Manifest-Version: 1.0\n").unwrap();

    zip.start_file(format!("{prefix}/package.json"), options).unwrap();
    write!(zip, r#"{{"name":"{package}","version":"1.0.0"}}"#).unwrap();
    for (name, contents) in files {
        zip.start_file(format!("{prefix}/{name}"), options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    path
}

/// mvnpm layout: `META-INF/resources/_static/<name>/package.json`
pub fn mvnpm_jar(dir: &Path, file_name: &str, package: &str, files: &[(&str, &str)]) -> PathBuf {
    jar(
        dir,
        file_name,
        &format!("META-INF/resources/_static/{package}"),
        package,
        files,
    )
}

/// webjar layout: `META-INF/resources/webjars/<name>/<version>/package.json`
pub fn webjar(dir: &Path, file_name: &str, package: &str, files: &[(&str, &str)]) -> PathBuf {
    jar(
        dir,
        file_name,
        &format!("META-INF/resources/webjars/{package}/1.0.0"),
        package,
        files,
    )
}

/// Writes an executable `/bin/sh` script standing in for esbuild.
#[cfg(unix)]
pub fn fake_esbuild(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shell snippet setting `$outdir` from the `--outdir=` argument.
pub const PARSE_OUTDIR: &str = r#"outdir=""
for arg in "$@"; do
  case "$arg" in
    --outdir=*) outdir="${arg#--outdir=}" ;;
  esac
done"#;

/// A fake esbuild that writes `out.js` into the output directory.
#[cfg(unix)]
pub fn bundling_esbuild(dir: &Path) -> PathBuf {
    fake_esbuild(
        dir,
        "esbuild-ok",
        &format!(
            r#"{PARSE_OUTDIR}
echo "args: $*"
echo "esbuild building" >&2
echo "export{{}};" > "$outdir/out.js"
exit 0"#
        ),
    )
}

/// Writes a gzip'd npm-style tarball holding `entry`.
pub fn esbuild_tgz(path: &Path, entry: &str, contents: &[u8]) {
    use flate2::{Compression, write::GzEncoder};

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (name, data) in [("package/package.json", &b"{}"[..]), (entry, contents)] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Polls `condition` every 20ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
