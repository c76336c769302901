//! End-to-end tests of the command line binary.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn bundler_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kodegen_bundler_esbuild").unwrap();
    cmd.env_remove("ESBUILD_VERSION")
        .env_remove("ESBUILD_BINARY")
        .env_remove("ESBUILD_REGISTRY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    bundler_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundle"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("resolve"));
}

#[test]
fn resolve_prints_configured_binary() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("esbuild");
    std::fs::write(&binary, "").unwrap();

    bundler_cmd()
        .arg("resolve")
        .env("ESBUILD_BINARY", &binary)
        .assert()
        .success()
        .stdout(predicate::str::contains(binary.display().to_string()));
}

#[test]
fn missing_binary_override_is_rejected() {
    bundler_cmd()
        .args(["--esbuild-binary", "/definitely/not/here/esbuild", "resolve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("esbuild binary not found"));
}

#[test]
fn install_populates_node_modules() {
    let jars = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let jar = common::mvnpm_jar(jars.path(), "lit-3.1.0.jar", "lit", &[("index.js", "export {};")]);

    bundler_cmd()
        .args(["install", "--type", "mvnpm", "--work-dir"])
        .arg(work.path())
        .arg(&jar)
        .assert()
        .success()
        .stdout(predicate::str::contains(work.path().display().to_string()));

    assert!(work.path().join("node_modules/lit/index.js").is_file());
}

#[test]
fn clear_requires_a_work_dir() {
    bundler_cmd()
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--work-dir"));
}

#[test]
fn clear_removes_node_modules() {
    let work = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(work.path().join("node_modules/lit")).unwrap();

    bundler_cmd()
        .args(["clear", "-w"])
        .arg(work.path())
        .assert()
        .success();

    assert!(!work.path().join("node_modules").exists());
}

#[test]
fn bundle_without_entries_fails() {
    bundler_cmd()
        .args(["--esbuild-binary", "/bin/sh", "bundle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one entry point is required"));
}

#[cfg(unix)]
#[test]
fn bundle_from_project_file() {
    let project = tempfile::tempdir().unwrap();
    let esbuild = common::bundling_esbuild(project.path());
    common::mvnpm_jar(project.path(), "lit-3.1.0.jar", "lit", &[]);
    std::fs::write(project.path().join("app.js"), "import 'lit';\n").unwrap();
    std::fs::write(
        project.path().join("bundle.toml"),
        format!(
            r#"
work_dir = "web"
dependencies = ["lit-3.1.0.jar"]
entries = [{{ file = "app.js" }}]

[esbuild]
minify = false

[bundler]
executable = "{}"
"#,
            esbuild.display()
        ),
    )
    .unwrap();

    bundler_cmd()
        .arg("--config")
        .arg(project.path().join("bundle.toml"))
        .arg("bundle")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bundled into"));

    let web = project.path().join("web");
    assert!(web.join("dist/out.js").is_file());
    assert!(web.join("node_modules/lit/package.json").is_file());
}
