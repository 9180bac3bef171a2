//! Common test utilities for integration tests
//!
//! Shared fixtures for snapshots, manifests and throwaway git repositories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use fleetprint::domain::models::{ProjectId, RepoSnapshot};

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call at the beginning of tests whose logs are worth seeing on failure.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Snapshot of `owner/repo` with the given files.
pub fn snapshot(files: &[(&str, &str)]) -> RepoSnapshot {
    RepoSnapshot::of(ProjectId::new("atomist", "sample"), files.iter().copied())
}

/// A `package.json` depending on `dependency` with the given scripts block.
pub fn manifest(name: &str, dependency: &str, scripts: &str) -> String {
    format!(
        "{{\n  \"name\": \"{name}\",\n  \"dependencies\": {{\n    \"{dependency}\": \"^1.0.0\"\n  }},\n  \"scripts\": {scripts}\n}}\n"
    )
}

/// Whether a usable `git` binary is on PATH.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Run git in `path`, panicking on failure, and return trimmed stdout.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Write `content` to `file` and commit it on the current branch.
pub fn commit_file(path: &Path, file: &str, content: &str, message: &str) -> String {
    std::fs::write(path.join(file), content).expect("Failed to write file");
    git(path, &["add", file]);
    git(path, &["commit", "--quiet", "-m", message]);
    git(path, &["rev-parse", "HEAD"])
}

/// Setup a git repository whose default branch is `main`
///
/// Returns the TempDir (keep it alive) and the repository path.
pub fn setup_test_git_repo() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().to_path_buf();

    git(&path, &["init", "--quiet"]);
    git(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&path, &["config", "user.email", "test@test.com"]);
    git(&path, &["config", "user.name", "Test User"]);
    git(&path, &["config", "commit.gpgsign", "false"]);

    (dir, path)
}
