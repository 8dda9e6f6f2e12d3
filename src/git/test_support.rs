//! Helpers for tests that need a real repository

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use super::Repository;

/// Run a git command in the given directory, panicking if it fails.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .expect("failed to execute git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a temp git repo on `main` with a single commit.
pub fn init_test_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    init_repo_at(dir.path());
    let repo = Repository::open(dir.path()).unwrap();
    (dir, repo)
}

/// Turn an existing directory into a git repo on `main` with one commit.
pub fn init_repo_at(path: &Path) {
    git(path, &["init", "-b", "main"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    std::fs::write(path.join("file.txt"), "hello").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "initial"]);
}
