//! Branch workflows built on top of the git client
//!
//! Listing the base branches of a repository and the two-step branch
//! creation (checkout base, then create-and-switch).

use thiserror::Error;
use tracing::{info, warn};

use crate::branch::{BranchName, NamingRules, filter_base_branches};
use crate::git::{Repository, VersionControlError};

/// Local branches that can serve as a base, in git's ref order
pub fn list_base_branches(repo: &Repository, rules: &NamingRules) -> Result<Vec<String>, VersionControlError> {
    let branches = repo.branches()?;
    let total = branches.len();
    let bases = filter_base_branches(branches, rules);
    info!(
        "{} of {} branches in {} are base candidates",
        bases.len(),
        total,
        repo.root().display()
    );
    Ok(bases)
}

/// A branch that was created and checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBranch {
    pub name: BranchName,
    pub base: String,
    /// Branch checked out before we started (`None` on a detached HEAD)
    pub previous: Option<String>,
}

/// Branch creation failed
///
/// The two steps are not atomic. When the base checkout succeeds and
/// creating the branch fails, the working tree stays on the base branch.
#[derive(Debug, Error)]
pub enum CreateBranchError {
    /// Checking out the base failed; the working tree is unchanged
    #[error("Failed to check out base branch '{base}': {source}")]
    CheckoutBase {
        base: String,
        #[source]
        source: VersionControlError,
    },

    /// The base is checked out but the new branch could not be created
    #[error("Failed to create branch '{name}' (now on '{base}'): {source}")]
    CreateBranch {
        base: String,
        name: BranchName,
        previous: Option<String>,
        #[source]
        source: VersionControlError,
    },
}

impl CreateBranchError {
    /// Branch the working tree was left on, if the failure moved it
    pub fn left_on(&self) -> Option<&str> {
        match self {
            CreateBranchError::CheckoutBase { .. } => None,
            CreateBranchError::CreateBranch { base, .. } => Some(base.as_str()),
        }
    }

    /// Branch checked out before the attempt (`None` on a detached HEAD)
    pub fn previous(&self) -> Option<&str> {
        match self {
            CreateBranchError::CheckoutBase { .. } => None,
            CreateBranchError::CreateBranch { previous, .. } => previous.as_deref(),
        }
    }

    /// The git error underneath
    pub fn version_control_error(&self) -> &VersionControlError {
        match self {
            CreateBranchError::CheckoutBase { source, .. }
            | CreateBranchError::CreateBranch { source, .. } => source,
        }
    }
}

/// Check out `base`, then create and switch to `name`
///
/// Nothing is rolled back: if the second step fails the repository is left
/// on `base`, reported through [`CreateBranchError::CreateBranch`].
pub fn create_branch(repo: &Repository, base: &str, name: &BranchName) -> Result<CreatedBranch, CreateBranchError> {
    let previous = repo.current_branch().unwrap_or_else(|e| {
        warn!("Could not determine the current branch: {}", e);
        None
    });

    repo.checkout(base)
        .map_err(|source| CreateBranchError::CheckoutBase {
            base: base.to_string(),
            source,
        })?;

    if let Err(source) = repo.checkout_new(name.as_str()) {
        warn!(
            "Creating '{}' failed, {} is left on '{}'",
            name,
            repo.root().display(),
            base
        );
        return Err(CreateBranchError::CreateBranch {
            base: base.to_string(),
            name: name.clone(),
            previous,
            source,
        });
    }

    info!("Branch {} created and switched", name);
    Ok(CreatedBranch {
        name: name.clone(),
        base: base.to_string(),
        previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::{BranchForm, build_branch_name};
    use crate::git::test_support::{git, init_test_repo};

    fn branch_name(repo: &Repository, base: &str, description: &str) -> BranchName {
        let form = BranchForm {
            repository: Some(repo.root().to_path_buf()),
            branch_type: "feature".to_string(),
            ticket: "ABC-123".to_string(),
            base: base.to_string(),
            description: description.to_string(),
        };
        build_branch_name(&form, &NamingRules::default()).unwrap()
    }

    #[test]
    fn test_list_base_branches() {
        let (dir, repo) = init_test_repo();
        for branch in ["develop", "feature/x", "bug/y", "bugfix/z", "feat/w", "release"] {
            git(dir.path(), &["branch", branch]);
        }

        let bases = list_base_branches(&repo, &NamingRules::default()).unwrap();
        assert_eq!(bases, vec!["develop", "main", "release"]);
    }

    #[test]
    fn test_create_branch() {
        let (dir, repo) = init_test_repo();
        git(dir.path(), &["branch", "develop"]);

        let name = branch_name(&repo, "develop", "add login");
        let created = create_branch(&repo, "develop", &name).unwrap();

        assert_eq!(created.name.as_str(), "feature/ABC-123/develop/add-login");
        assert_eq!(created.previous.as_deref(), Some("main"));
        assert_eq!(
            repo.current_branch().unwrap().as_deref(),
            Some("feature/ABC-123/develop/add-login")
        );
    }

    #[test]
    fn test_existing_name_leaves_base_checked_out() {
        let (dir, repo) = init_test_repo();
        git(dir.path(), &["branch", "develop"]);
        let name = branch_name(&repo, "develop", "add login");
        git(dir.path(), &["branch", name.as_str()]);

        let err = create_branch(&repo, "develop", &name).unwrap_err();

        assert!(matches!(err, CreateBranchError::CreateBranch { .. }));
        assert_eq!(err.left_on(), Some("develop"));
        assert!(matches!(
            err.version_control_error(),
            VersionControlError::CommandFailed { .. }
        ));
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("develop"));
    }

    #[test]
    fn test_unknown_base_leaves_tree_unchanged() {
        let (_dir, repo) = init_test_repo();
        let name = branch_name(&repo, "nope", "x");

        let err = create_branch(&repo, "nope", &name).unwrap_err();

        assert!(matches!(err, CreateBranchError::CheckoutBase { .. }));
        assert_eq!(err.left_on(), None);
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn test_non_branch_base_keeps_local_edits() {
        let (dir, repo) = init_test_repo();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "local edits").unwrap();

        for base in ["file.txt", "-f", "HEAD"] {
            let name = branch_name(&repo, base, "x");
            let err = create_branch(&repo, base, &name).unwrap_err();

            assert!(matches!(
                err,
                CreateBranchError::CheckoutBase {
                    source: VersionControlError::NoSuchBranch { .. },
                    ..
                }
            ));
            assert!(!repo.has_branch(name.as_str()).unwrap());
        }

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "local edits");
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }
}
