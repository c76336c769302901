//! npm package manifest discovery inside extracted archives.

use crate::bundler::InstallError;
use std::path::{Path, PathBuf};

/// Fields of `package.json` the installer relies on.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PackageManifest {
    /// Declared package name, possibly scoped (`@scope/pkg`)
    pub name: String,

    /// Declared version
    #[serde(default)]
    pub version: Option<String>,
}

/// Returns the shallowest `package.json` at or below `search_root`.
///
/// Ties at the same depth resolve to the lexicographically first path so the
/// choice does not depend on directory iteration order.
pub fn find_manifest(search_root: &Path) -> Option<PathBuf> {
    if !search_root.is_dir() {
        return None;
    }

    walkdir::WalkDir::new(search_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "package.json")
        .min_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path().cmp(b.path())))
        .map(|entry| entry.into_path())
}

/// Reads and validates a `package.json`.
pub fn load_manifest(path: &Path) -> Result<PackageManifest, InstallError> {
    let invalid = |reason: String| InstallError::Manifest {
        manifest: path.to_path_buf(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let manifest: PackageManifest =
        serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

    validate_name(&manifest.name).map_err(invalid)?;
    Ok(manifest)
}

/// Package names become paths under `node_modules`; only `name` or
/// `@scope/name` are accepted.
fn validate_name(name: &str) -> Result<(), String> {
    let segments: Vec<&str> = name.split('/').collect();
    let well_formed = match segments.as_slice() {
        [single] => !single.starts_with('@'),
        [scope, _] => scope.len() > 1 && scope.starts_with('@'),
        _ => false,
    };
    let safe = segments
        .iter()
        .all(|s| !s.is_empty() && *s != "." && *s != ".." && !s.contains('\\'));

    if well_formed && safe {
        Ok(())
    } else {
        Err(format!("invalid package name {name:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallowest_manifest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("lit/3.1.0");
        std::fs::create_dir_all(pkg.join("node_modules/dep")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{"name":"lit"}"#).unwrap();
        std::fs::write(pkg.join("node_modules/dep/package.json"), r#"{"name":"dep"}"#).unwrap();

        assert_eq!(find_manifest(dir.path()), Some(pkg.join("package.json")));
    }

    #[test]
    fn missing_search_root_has_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_manifest(&dir.path().join("META-INF")), None);
    }

    #[test]
    fn scoped_names_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"name":"@lit/reactive-element","version":"2.0.0"}"#).unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.name, "@lit/reactive-element");
        assert_eq!(manifest.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn traversal_names_are_rejected() {
        for name in ["../evil", "@scope", "a/b", "@s/../x", ""] {
            assert!(validate_name(name).is_err(), "{name} accepted");
        }
    }

    #[test]
    fn unparsable_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(InstallError::Manifest { .. })
        ));
    }
}
