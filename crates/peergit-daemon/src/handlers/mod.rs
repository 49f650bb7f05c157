//! Request handlers.
//!
//! Every repository-scoped handler follows the same order: resolve the alias,
//! confine any peer paths, take the repository lock, then touch the working
//! copy. Failures become `success: false` responses; nothing here closes the
//! stream.

pub(crate) mod branches;
pub(crate) mod files;
pub(crate) mod repos;
pub(crate) mod vcs;

use peergit_git::{GitError, VcsOutput};

/// Flattens a backend result into `(success, output)`.
pub(crate) fn outcome(result: Result<VcsOutput, GitError>) -> (bool, String) {
    match result {
        Ok(out) => (out.ok, out.output),
        Err(e) => {
            tracing::warn!(error = %e, "Git command could not run");
            (false, e.to_string())
        }
    }
}
