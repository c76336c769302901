//! Pulling the esbuild binary out of a package tarball.

use flate2::read::GzDecoder;
use std::io;
use std::path::Path;

/// Unpacks the single archive member `entry` of a gzip'd tarball to `dest`
/// and marks it executable.
///
/// Blocking; call from `spawn_blocking`.
pub(super) fn extract_binary(tarball: &[u8], entry: &str, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(tarball));

    let mut found = false;
    for member in archive.entries()? {
        let mut member = member?;
        if member.path()? == Path::new(entry) {
            member.unpack(dest)?;
            found = true;
            break;
        }
    }
    if !found {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{entry} not present in archive"),
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Whether `path` is a regular file the current user may execute.
pub(super) fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};

    fn tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn extracts_named_member_only() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = tarball(&[
            ("package/package.json", b"{}"),
            ("package/bin/esbuild", b"#!/bin/sh\n"),
        ]);
        let dest = dir.path().join("esbuild");
        extract_binary(&bytes, "package/bin/esbuild", &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"#!/bin/sh\n");
        assert!(is_executable(&dest));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_member_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = tarball(&[("package/README.md", b"hi")]);
        let err = extract_binary(&bytes, "package/bin/esbuild", &dir.path().join("esbuild"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_executable(dir.path()));
        assert!(!is_executable(&dir.path().join("absent")));
    }
}
