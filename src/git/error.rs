//! Errors raised by git invocations

use std::path::PathBuf;
use thiserror::Error;

/// A git command could not be run or reported failure
#[derive(Debug, Error)]
pub enum VersionControlError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("'{name}' is not a local branch")]
    NoSuchBranch { name: String },

    #[error("'{}' is not the top level of a git repository", path.display())]
    NotARepository { path: PathBuf },
}
