//! Entry point definitions.

use crate::bundler::error::{Context, ErrorExt, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// An esbuild entry point, materialised inside the work directory.
///
/// Entry points must live in the work directory so that bare imports resolve
/// against its `node_modules`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entry {
    /// A single source file. Relative paths are taken as relative to the work
    /// directory; absolute paths outside it are copied in.
    File(PathBuf),

    /// A generated `<name>.js` that imports each script in order. The scripts
    /// are copied into the work directory next to it.
    Script {
        /// Name of the generated entry (without extension)
        name: String,
        /// Scripts to import
        scripts: Vec<PathBuf>,
    },
}

impl Entry {
    /// Creates a file entry.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Creates a script entry.
    pub fn script(name: impl Into<String>, scripts: Vec<PathBuf>) -> Self {
        Self::Script {
            name: name.into(),
            scripts,
        }
    }

    /// Places every entry inside `work_dir` and returns the paths esbuild
    /// should receive, in order.
    ///
    /// Fails before touching the work directory when two entries would write
    /// the same file there.
    pub async fn process_all(entries: &[Entry], work_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = HashSet::new();
        for entry in entries {
            for path in entry.written_paths(work_dir)? {
                if !written.insert(path.clone()) {
                    crate::bail!(
                        "entries collide on {}: rename one of them",
                        path.display()
                    );
                }
            }
        }

        let mut placed = Vec::with_capacity(entries.len());
        for entry in entries {
            placed.push(entry.process(work_dir).await?);
        }
        Ok(placed)
    }

    /// Places the entry inside `work_dir` and returns the path esbuild should
    /// receive.
    pub async fn process(&self, work_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::File(path) => place(path, work_dir).await,
            Self::Script { name, scripts } => {
                let entry = work_dir.join(script_file_name(name)?);

                let mut source = String::new();
                for script in scripts {
                    let placed = place(script, work_dir).await?;
                    let file_name = placed
                        .strip_prefix(work_dir)
                        .context("script is outside the work directory")?;
                    source.push_str(&format!(
                        "import \"./{}\";\n",
                        file_name.to_string_lossy().replace('\\', "/")
                    ));
                }

                tokio::fs::write(&entry, source)
                    .await
                    .fs_context("writing script entry", &entry)?;
                Ok(entry)
            }
        }
    }

    /// Files [`process`](Self::process) creates or overwrites in `work_dir`.
    fn written_paths(&self, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let copies = |paths: &[PathBuf]| -> Result<Vec<PathBuf>> {
            paths
                .iter()
                .filter(|path| needs_copy(path, work_dir))
                .map(|path| copy_target(path, work_dir))
                .collect()
        };

        match self {
            Self::File(path) => copies(std::slice::from_ref(path)),
            Self::Script { name, scripts } => {
                let mut paths = copies(scripts)?;
                paths.push(work_dir.join(script_file_name(name)?));
                Ok(paths)
            }
        }
    }
}

/// Relative paths and paths already under the work dir are used in place.
fn needs_copy(path: &Path, work_dir: &Path) -> bool {
    path.is_absolute() && !path.starts_with(work_dir)
}

async fn place(path: &Path, work_dir: &Path) -> Result<PathBuf> {
    if path.is_relative() {
        return Ok(work_dir.join(path));
    }
    if !needs_copy(path, work_dir) {
        return Ok(path.to_path_buf());
    }

    let dest = copy_target(path, work_dir)?;
    crate::bundler::utils::fs::copy_file(path, &dest).await?;
    Ok(dest)
}

fn copy_target(path: &Path, work_dir: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .context(format!("entry {} has no file name", path.display()))?;
    Ok(work_dir.join(file_name))
}

/// `<name>.js`, where `name` must be a plain file name.
fn script_file_name(name: &str) -> Result<String> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\']);
    if !plain {
        crate::bail!("script entry name {name:?} must be a plain file name");
    }
    Ok(format!("{name}.js"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn relative_file_resolves_against_work_dir() {
        let work = tempfile::tempdir().unwrap();
        let entry = Entry::file("src/main.js");
        assert_eq!(
            entry.process(work.path()).await.unwrap(),
            work.path().join("src/main.js")
        );
    }

    #[tokio::test]
    async fn absolute_file_is_copied_into_work_dir() {
        let work = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let source = outside.path().join("app.js");
        std::fs::write(&source, "console.log(1);").unwrap();

        let placed = Entry::file(&source).process(work.path()).await.unwrap();
        assert_eq!(placed, work.path().join("app.js"));
        assert_eq!(std::fs::read_to_string(placed).unwrap(), "console.log(1);");
    }

    #[tokio::test]
    async fn script_entry_imports_scripts_in_order() {
        let work = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let a = outside.path().join("a.js");
        std::fs::write(&a, "export const a = 1;").unwrap();

        let entry = Entry::script("main", vec![a, PathBuf::from("b.js")]);
        let placed = entry.process(work.path()).await.unwrap();

        assert_eq!(placed, work.path().join("main.js"));
        assert_eq!(
            std::fs::read_to_string(placed).unwrap(),
            "import \"./a.js\";\nimport \"./b.js\";\n"
        );
        assert!(work.path().join("a.js").exists());
    }

    #[tokio::test]
    async fn colliding_copies_are_rejected_before_writing() {
        let work = tempfile::tempdir().unwrap();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [&a, &b] {
            std::fs::write(dir.path().join("app.js"), "export {};").unwrap();
        }

        let entries = [
            Entry::file(a.path().join("app.js")),
            Entry::file(b.path().join("app.js")),
        ];
        let err = Entry::process_all(&entries, work.path()).await.unwrap_err();
        assert!(err.to_string().contains("collide"));
        assert!(!work.path().join("app.js").exists());
    }

    #[tokio::test]
    async fn script_named_like_a_copied_file_collides() {
        let work = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let main = outside.path().join("main.js");
        std::fs::write(&main, "export {};").unwrap();

        let entries = [Entry::file(&main), Entry::script("main", vec![])];
        assert!(Entry::process_all(&entries, work.path()).await.is_err());
    }

    #[tokio::test]
    async fn script_names_must_be_plain_file_names() {
        let parent = tempfile::tempdir().unwrap();
        let work = parent.path().join("work");
        std::fs::create_dir(&work).unwrap();

        for name in ["../escape", "nested/main", "..", ".", "", "/abs"] {
            let entry = Entry::script(name, vec![]);
            assert!(entry.process(&work).await.is_err(), "{name:?} accepted");
        }
        assert!(!parent.path().join("escape.js").exists());
    }

    #[tokio::test]
    async fn absolute_script_inside_work_dir_is_used_in_place() {
        let work = tempfile::tempdir().unwrap();
        let script = work.path().join("lib.js");
        std::fs::write(&script, "export const x = 1;").unwrap();

        let entry = Entry::script("main", vec![script.clone()]);
        entry.process(work.path()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&script).unwrap(), "export const x = 1;");
    }
}
