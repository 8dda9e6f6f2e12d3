//! Repository discovery
//!
//! Walks a folder and reports every directory that directly contains a
//! `.git` directory.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the git metadata directory
pub const GIT_DIR_NAME: &str = ".git";

/// The folder walk failed
#[derive(Debug, Error)]
#[error("Failed to scan '{}': {source}", path.display())]
pub struct LocateError {
    pub path: PathBuf,
    #[source]
    pub source: walkdir::Error,
}

/// How the repository scan treats nested and skipped directories
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Keep walking below a discovered repository, reporting nested ones
    pub descend_into_repositories: bool,
    /// Directory names the walk never enters
    pub skip: Vec<glob::Pattern>,
}

impl ScanOptions {
    /// Build options from config values; invalid patterns are dropped
    pub fn new(descend_into_repositories: bool, skip_patterns: &[String]) -> Self {
        let skip = skip_patterns
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid skip pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            descend_into_repositories,
            skip,
        }
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip.iter().any(|p| p.matches(name))
    }
}

/// Find all git working trees under `root`, `root` included
///
/// Results come in walk order (directory entries sorted by file name).
/// An empty result is not an error.
pub fn find_repositories(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, LocateError> {
    debug!("Scanning {} for git repositories", root.display());

    let mut repos = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| LocateError {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if entry.depth() > 0 && (name == GIT_DIR_NAME || options.is_skipped(&name)) {
            walker.skip_current_dir();
            continue;
        }

        if entry.path().join(GIT_DIR_NAME).is_dir() {
            debug!("Found repository: {}", entry.path().display());
            repos.push(entry.path().to_path_buf());

            if !options.descend_into_repositories {
                walker.skip_current_dir();
            }
        }
    }

    debug!("Found {} repositories under {}", repos.len(), root.display());
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    fn relative(root: &Path, repos: Vec<PathBuf>) -> Vec<String> {
        repos
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_nested_repositories_are_pruned() {
        let dir = TempDir::new().unwrap();
        mkdirs(dir.path(), &["A/.git", "A/sub/.git", "B/.git", "C/src"]);

        let repos = find_repositories(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(relative(dir.path(), repos), vec!["A", "B"]);
    }

    #[test]
    fn test_nested_repositories_when_descending() {
        let dir = TempDir::new().unwrap();
        mkdirs(dir.path(), &["A/.git", "A/sub/.git", "B/.git"]);

        let options = ScanOptions::new(true, &[]);
        let repos = find_repositories(dir.path(), &options).unwrap();
        assert_eq!(relative(dir.path(), repos), vec!["A", "A/sub", "B"]);
    }

    #[test]
    fn test_no_repositories() {
        let dir = TempDir::new().unwrap();
        mkdirs(dir.path(), &["docs/notes", "src"]);

        let repos = find_repositories(dir.path(), &ScanOptions::default()).unwrap();
        assert!(repos.is_empty());
    }

    #[test]
    fn test_root_is_repository() {
        let dir = TempDir::new().unwrap();
        mkdirs(dir.path(), &[".git", "vendor/lib/.git"]);

        let repos = find_repositories(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(repos, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn test_git_file_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        mkdirs(dir.path(), &["worktree", "real/.git"]);
        fs::write(dir.path().join("worktree/.git"), "gitdir: /elsewhere").unwrap();

        let repos = find_repositories(dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(relative(dir.path(), repos), vec!["real"]);
    }

    #[test]
    fn test_skip_patterns() {
        let dir = TempDir::new().unwrap();
        mkdirs(
            dir.path(),
            &["app/.git", "node_modules/pkg/.git", "cache-1/x/.git"],
        );

        let options = ScanOptions::new(
            false,
            &["node_modules".to_string(), "cache-*".to_string(), "[".to_string()],
        );
        assert_eq!(options.skip.len(), 2);

        let repos = find_repositories(dir.path(), &options).unwrap();
        assert_eq!(relative(dir.path(), repos), vec!["app"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = find_repositories(&missing, &ScanOptions::default()).unwrap_err();
        assert_eq!(err.path, missing);
    }
}
