//! Git error types.

use thiserror::Error;

/// Errors raised before or around a git invocation.
///
/// A git command that runs and exits non-zero is not an error at this level;
/// it comes back as a [`VcsOutput`](crate::VcsOutput) with `ok == false`.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A branch name that could be mistaken for an option or is otherwise unusable.
    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// The checked-out branch could not be determined.
    #[error("could not determine current branch: {0}")]
    CurrentBranch(String),
}

/// A specialized Result type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;
