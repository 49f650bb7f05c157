//! Stash-aware branch switching.
//!
//! Switching away from a branch parks its uncommitted work (untracked files
//! included) in a stash tagged with the branch name. Switching back pops the
//! most recent stash carrying that tag. The current branch is always read from
//! the working copy.

use crate::{find_stash, parse_stash_list, validate_branch_name, Repo, Result, StashTag};

/// How a switch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The target was already checked out; nothing ran.
    AlreadyOnBranch {
        /// The branch.
        branch: String,
    },
    /// Checked out and the target's parked work was popped.
    Restored {
        /// The new branch.
        branch: String,
        /// Output of the pop.
        output: String,
    },
    /// Checked out; no parked work existed for the target.
    NothingToRestore {
        /// The new branch.
        branch: String,
    },
    /// Checkout failed. Work stashed for the old branch stays in the stash list.
    CheckoutFailed {
        /// The branch that could not be checked out.
        branch: String,
        /// Output of the checkout.
        output: String,
    },
    /// Checked out, but popping the target's parked work failed.
    RestoreFailed {
        /// The new branch.
        branch: String,
        /// Output of the pop.
        output: String,
    },
}

impl SwitchOutcome {
    /// Whether the peer should be told the switch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::AlreadyOnBranch { .. } | Self::Restored { .. } | Self::NothingToRestore { .. }
        )
    }

    /// Human-readable summary for the response.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AlreadyOnBranch { branch } => format!("Already on branch '{branch}'."),
            Self::Restored { branch, output } => format!(
                "Switched to branch '{branch}'.\nRestored previous work for this branch:\n{output}"
            ),
            Self::NothingToRestore { branch } => format!(
                "Switched to branch '{branch}'. No previous work was stashed for this branch."
            ),
            Self::CheckoutFailed { output, .. } => output.clone(),
            Self::RestoreFailed { branch, output } => format!(
                "Switched to branch '{branch}', but restoring its stashed work failed:\n{output}"
            ),
        }
    }
}

/// Switches `repo` to `target`, parking and restoring uncommitted work.
///
/// Only an invalid target name or a failure to read the current branch is an
/// `Err`; every other path ends in a [`SwitchOutcome`].
pub async fn switch_branch(repo: &Repo<'_>, target: &str) -> Result<SwitchOutcome> {
    validate_branch_name(target)?;
    let current = repo.current_branch().await?;

    if current == target {
        return Ok(SwitchOutcome::AlreadyOnBranch {
            branch: target.to_string(),
        });
    }

    let park = StashTag::for_branch(&current);
    let stashed = repo
        .run(&["stash", "push", "--include-untracked", "-m", park.as_str()])
        .await?;
    tracing::debug!(
        root = %repo.root().display(),
        from = %current,
        ok = stashed.ok,
        output = %stashed.trimmed(),
        "Parked work before switch"
    );

    let checkout = repo.run(&["checkout", target]).await?;
    if !checkout.ok {
        tracing::warn!(root = %repo.root().display(), from = %current, to = %target, "Checkout failed");
        return Ok(SwitchOutcome::CheckoutFailed {
            branch: target.to_string(),
            output: checkout.output,
        });
    }

    let list = repo.run(&["stash", "list"]).await?;
    let entries = if list.ok {
        parse_stash_list(&list.output)
    } else {
        Vec::new()
    };

    let Some(entry) = find_stash(&entries, &StashTag::for_branch(target)) else {
        return Ok(SwitchOutcome::NothingToRestore {
            branch: target.to_string(),
        });
    };

    let pop = repo.run(&["stash", "pop", &entry.reference]).await?;
    if pop.ok {
        tracing::info!(root = %repo.root().display(), branch = %target, stash = %entry.reference, "Restored parked work");
        Ok(SwitchOutcome::Restored {
            branch: target.to_string(),
            output: pop.output,
        })
    } else {
        tracing::warn!(root = %repo.root().display(), branch = %target, stash = %entry.reference, "Restoring parked work failed");
        Ok(SwitchOutcome::RestoreFailed {
            branch: target.to_string(),
            output: pop.output,
        })
    }
}
