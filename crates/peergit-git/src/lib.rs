//! # Peergit Git
//!
//! Everything the daemon does to a working copy goes through this crate.
//!
//! - [`VcsBackend`]: the seam between handlers and the version-control tool.
//!   [`GitCli`] runs the real `git` binary; `FakeGit` (feature `test-utils`)
//!   is an in-memory model for tests.
//! - [`Repo`]: the git verbs the daemon exposes, with their output
//!   normalised the way peers expect to read it.
//! - [`switch_branch`]: a branch switch that parks uncommitted work in a
//!   branch-tagged stash and restores the target branch's parked work.
//! - [`RepoLocks`]: one async mutex per repository root so requests against
//!   the same working copy never interleave.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod branch;
mod error;
#[cfg(any(test, feature = "test-utils"))]
mod fake;
mod locks;
mod repo;
mod stash;
mod switch;

pub use backend::{GitCli, VcsBackend, VcsOutput};
pub use branch::validate_branch_name;
pub use error::{GitError, Result};
#[cfg(any(test, feature = "test-utils"))]
pub use fake::{FakeGit, Invocation};
pub use locks::{RepoGuard, RepoLocks};
pub use repo::{Repo, LOG_LIMIT, REMOTE_STASH_MESSAGE};
pub use stash::{find_stash, parse_stash_list, StashEntry, StashTag, STASH_TAG_PREFIX};
pub use switch::{switch_branch, SwitchOutcome};
