//! File system utilities for bundling.
//!
//! Provides idempotent directory operations, file and tree copies with
//! automatic parent creation, and a rename-or-copy move.

use crate::bundler::error::{Error, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    Ok(fs::create_dir_all(path).await?)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e.into()),
    }
}

/// Blocking variant of [`remove_dir_all`] for use inside `spawn_blocking`.
pub fn remove_dir_all_blocking(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Makes a symbolic link.
#[cfg(unix)]
fn symlink(src: &Path, dst: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link.
#[cfg(windows)]
fn symlink(src: &Path, dst: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to).await?;
    Ok(())
}

/// Recursively copies a directory tree, preserving symlinks.
///
/// Blocking; call from `spawn_blocking` or another blocking context.
pub fn copy_dir_blocking(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())?;
            symlink(&target, &dest_path, entry.path().is_dir())?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(dest_path)?;
        } else {
            std::fs::copy(entry.path(), dest_path)?;
        }
    }

    Ok(())
}

/// Moves a directory, falling back to copy-then-delete when a rename is not
/// possible (e.g. across file systems).
///
/// Blocking; call from `spawn_blocking` or another blocking context.
pub fn move_dir_blocking(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            log::debug!(
                "rename {} -> {} failed ({rename_err}), copying instead",
                from.display(),
                to.display()
            );
            if let Err(e) = copy_dir_blocking(from, to) {
                // Leave no half-copied package behind
                let _ = remove_dir_all_blocking(to);
                return Err(e);
            }
            remove_dir_all_blocking(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_dir_all(&dir.path().join("absent")).await.unwrap();
    }

    #[tokio::test]
    async fn create_dir_all_with_erase_empties_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("old.js"), "old").unwrap();

        create_dir_all(&dist, true).await.unwrap();
        assert!(dist.is_dir());
        assert!(!dist.join("old.js").exists());
    }

    #[test]
    fn move_dir_carries_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        std::fs::create_dir_all(from.join("lib")).unwrap();
        std::fs::write(from.join("lib/index.js"), "x").unwrap();

        let to = dir.path().join("node_modules/@scope/a");
        move_dir_blocking(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(to.join("lib/index.js")).unwrap(), "x");
    }

    #[test]
    fn copy_dir_preserves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("src");
        std::fs::create_dir_all(from.join("deep/er")).unwrap();
        std::fs::write(from.join("deep/er/f.txt"), "f").unwrap();

        let to = dir.path().join("dst");
        copy_dir_blocking(&from, &to).unwrap();
        assert!(to.join("deep/er/f.txt").is_file());
        assert!(from.join("deep/er/f.txt").is_file());
    }
}
