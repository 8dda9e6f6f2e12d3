//! Repository handle and branch operations using git CLI

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::VersionControlError;

/// Run git in `dir` and return its trimmed stdout
fn run_git(dir: &Path, args: &[&str]) -> Result<String, VersionControlError> {
    let command = format!("git {}", args.join(" "));
    debug!("Running `{}` in {}", command, dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| VersionControlError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!("`{}` exited with {}: {}", command, output.status, stderr);
        return Err(VersionControlError::CommandFailed { command, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Wrapper around a git working tree (uses git CLI)
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Open the working tree whose top level is exactly `path`
    ///
    /// Unlike `git` itself this does not search parent directories: a
    /// subdirectory of a working tree is not accepted.
    pub fn open(path: &Path) -> Result<Self, VersionControlError> {
        let not_a_repo = || VersionControlError::NotARepository {
            path: path.to_path_buf(),
        };

        if !path.is_dir() {
            return Err(not_a_repo());
        }

        let toplevel = match run_git(path, &["rev-parse", "--show-toplevel"]) {
            Ok(toplevel) => PathBuf::from(toplevel),
            Err(VersionControlError::CommandFailed { .. }) => return Err(not_a_repo()),
            Err(e) => return Err(e),
        };

        if !same_dir(&toplevel, path) {
            debug!(
                "{} is inside the working tree at {}",
                path.display(),
                toplevel.display()
            );
            return Err(not_a_repo());
        }

        debug!("Opened git repository at: {}", path.display());
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all local branches, in git's ref order
    pub fn branches(&self) -> Result<Vec<String>, VersionControlError> {
        let stdout = run_git(
            &self.root,
            &["for-each-ref", "--format=%(refname:short)", "refs/heads"],
        )?;

        let branches: Vec<String> = stdout
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        debug!("Found {} local branches in {}", branches.len(), self.root.display());
        Ok(branches)
    }

    /// The checked-out branch, or `None` on a detached HEAD
    pub fn current_branch(&self) -> Result<Option<String>, VersionControlError> {
        let current = run_git(&self.root, &["branch", "--show-current"])?;
        Ok(if current.is_empty() { None } else { Some(current) })
    }

    /// Whether `name` is a local branch
    pub fn has_branch(&self, name: &str) -> Result<bool, VersionControlError> {
        let refname = format!("refs/heads/{}", name);
        match run_git(&self.root, &["rev-parse", "--verify", "--quiet", &refname]) {
            Ok(_) => Ok(true),
            Err(VersionControlError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Switch the working tree to an existing local branch
    ///
    /// Names that are not local branches are refused before git runs, so a
    /// file path is never restored over local edits.
    pub fn checkout(&self, name: &str) -> Result<(), VersionControlError> {
        if !self.has_branch(name)? {
            return Err(VersionControlError::NoSuchBranch {
                name: name.to_string(),
            });
        }
        info!("Checking out '{}' in {}", name, self.root.display());
        run_git(&self.root, &["checkout", name, "--"])?;
        Ok(())
    }

    /// Create a branch at HEAD and switch to it
    pub fn checkout_new(&self, name: &str) -> Result<(), VersionControlError> {
        info!("Creating branch '{}' in {}", name, self.root.display());
        // `-b` takes the next argument as its value, even one starting with `-`
        run_git(&self.root, &["checkout", "-b", name, "--"])?;
        Ok(())
    }
}

/// Compare two directories after resolving symlinks
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
