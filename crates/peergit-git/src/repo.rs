//! Git verbs exposed to peers.

use crate::{validate_branch_name, GitError, Result, VcsBackend, VcsOutput};
use std::path::Path;

/// Number of commits returned by [`Repo::log`].
pub const LOG_LIMIT: usize = 15;

/// Message used for stashes requested directly by a peer.
pub const REMOTE_STASH_MESSAGE: &str = "p2p-remote-stash";

const LOG_FORMAT: &str = "--pretty=format:%h -%d %s (%cr) <%an>";

/// A working copy, addressed through a backend.
///
/// Callers are expected to hold the root's [`RepoGuard`](crate::RepoGuard)
/// across a whole request.
#[derive(Clone, Copy)]
pub struct Repo<'a> {
    backend: &'a dyn VcsBackend,
    root: &'a Path,
}

impl<'a> Repo<'a> {
    /// Binds `backend` to the working copy at `root`.
    pub fn new(backend: &'a dyn VcsBackend, root: &'a Path) -> Self {
        Self { backend, root }
    }

    /// The repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root
    }

    /// Runs a raw command in the root.
    pub async fn run(&self, args: &[&str]) -> Result<VcsOutput> {
        self.backend.run(self.root, args).await
    }

    /// Name of the checked-out branch.
    pub async fn current_branch(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let branch = out.trimmed();
        if !out.ok || branch.is_empty() {
            return Err(GitError::CurrentBranch(branch.to_string()));
        }
        Ok(branch.to_string())
    }

    /// Local branch names.
    pub async fn list_branches(&self) -> Result<(Vec<String>, VcsOutput)> {
        let out = self.run(&["branch", "--format=%(refname:short)"]).await?;
        let branches = if out.ok {
            out.output
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            Vec::new()
        };
        Ok((branches, out))
    }

    /// Creates `name` at the current commit without switching to it.
    pub async fn create_branch(&self, name: &str) -> Result<VcsOutput> {
        validate_branch_name(name)?;
        let out = self.run(&["branch", name]).await?;
        if out.ok {
            return Ok(VcsOutput::success(format!("Branch '{name}' created.")));
        }
        Ok(out)
    }

    /// Whether `path` (relative to the root) is tracked.
    pub async fn is_tracked(&self, path: &str) -> Result<bool> {
        let out = self.run(&["ls-files", "--error-unmatch", "--", path]).await?;
        Ok(out.ok)
    }

    /// Renames a tracked file so the move is staged.
    pub async fn move_tracked(&self, old: &str, new: &str) -> Result<VcsOutput> {
        self.run(&["mv", "--", old, new]).await
    }

    /// Checks out `branch`, stages everything, commits, then pushes.
    ///
    /// A clean tree is reported as a success. Pushing is skipped when `remote`
    /// is `None`.
    pub async fn commit(&self, message: &str, branch: &str, remote: Option<&str>) -> Result<VcsOutput> {
        validate_branch_name(branch)?;

        let checkout = self.run(&["checkout", branch]).await?;
        if !checkout.ok {
            return Ok(checkout);
        }

        let add = self.run(&["add", "-A"]).await?;
        if !add.ok {
            return Ok(add);
        }

        let commit = self.run(&["commit", "-m", message]).await?;
        if !commit.ok {
            if commit.output.contains("nothing to commit") {
                return Ok(VcsOutput::success("Working tree is clean. Nothing to commit."));
            }
            return Ok(commit);
        }

        let Some(remote) = remote else {
            return Ok(commit);
        };

        let push = self.run(&["push", remote, branch]).await?;
        if !push.ok {
            tracing::warn!(root = %self.root.display(), remote, branch, "Push after commit failed");
            return Ok(VcsOutput::failure(format!(
                "Committed, but push to {remote}/{branch} failed:\n{}",
                push.output
            )));
        }

        Ok(VcsOutput::success(format!(
            "Successfully pushed to {remote}/{branch}\n{}",
            push.output
        )))
    }

    /// Short status; a clean tree reads `Working tree is clean.`
    pub async fn status(&self) -> Result<VcsOutput> {
        let out = self.run(&["status", "--porcelain"]).await?;
        if out.ok && out.trimmed().is_empty() {
            return Ok(VcsOutput::success("Working tree is clean."));
        }
        Ok(out)
    }

    /// The last [`LOG_LIMIT`] commits as a graph.
    pub async fn log(&self) -> Result<VcsOutput> {
        let limit = LOG_LIMIT.to_string();
        self.run(&["log", "--graph", LOG_FORMAT, "--abbrev-commit", "-n", &limit])
            .await
    }

    /// Working-tree diff, optionally limited to one path.
    pub async fn diff(&self, path: Option<&str>) -> Result<VcsOutput> {
        let out = match path {
            Some(path) => self.run(&["diff", "--", path]).await?,
            None => self.run(&["diff"]).await?,
        };
        if out.ok && out.trimmed().is_empty() {
            return Ok(VcsOutput::success("No differences found."));
        }
        Ok(out)
    }

    /// Stashes everything, untracked files included.
    pub async fn stash_save(&self) -> Result<VcsOutput> {
        self.run(&["stash", "push", "--include-untracked", "-m", REMOTE_STASH_MESSAGE])
            .await
    }

    /// Applies and drops the most recent stash.
    pub async fn stash_pop(&self) -> Result<VcsOutput> {
        self.run(&["stash", "pop"]).await
    }

    /// Discards all uncommitted changes to tracked files.
    pub async fn reset_hard(&self) -> Result<VcsOutput> {
        tracing::warn!(root = %self.root.display(), "Hard reset requested");
        self.run(&["reset", "--hard", "HEAD"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FakeGit;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn setup() -> (FakeGit, PathBuf) {
        let root = PathBuf::from("/work/repo");
        let git = FakeGit::new();
        git.init_repo(&root, "main");
        (git, root)
    }

    #[tokio::test]
    async fn clean_status_and_diff_are_described() {
        let (git, root) = setup();
        let repo = Repo::new(&git, &root);

        assert_eq!(repo.status().await.unwrap().output, "Working tree is clean.");
        assert_eq!(repo.diff(None).await.unwrap().output, "No differences found.");
    }

    #[tokio::test]
    async fn create_branch_reports_name() {
        let (git, root) = setup();
        let repo = Repo::new(&git, &root);

        let out = repo.create_branch("feature").await.unwrap();
        assert!(out.ok);
        assert_eq!(out.output, "Branch 'feature' created.");

        let (branches, _) = repo.list_branches().await.unwrap();
        assert_eq!(branches, vec!["feature", "main"]);

        let again = repo.create_branch("feature").await.unwrap();
        assert!(!again.ok);
    }

    #[tokio::test]
    async fn option_like_branch_never_reaches_git() {
        let (git, root) = setup();
        let repo = Repo::new(&git, &root);

        assert!(matches!(
            repo.create_branch("--help").await,
            Err(GitError::InvalidBranchName(_))
        ));
        assert!(git.invocations().is_empty());
    }

    #[tokio::test]
    async fn commit_on_clean_tree_is_success() {
        let (git, root) = setup();
        let repo = Repo::new(&git, &root);

        let out = repo.commit("nothing", "main", Some("origin")).await.unwrap();
        assert!(out.ok);
        assert_eq!(out.output, "Working tree is clean. Nothing to commit.");
        assert!(git.pushes(&root).is_empty());
    }

    #[tokio::test]
    async fn commit_stages_commits_and_pushes() {
        let (git, root) = setup();
        git.edit(&root, "README.md", "hello");
        let repo = Repo::new(&git, &root);

        let out = repo.commit("docs", "main", Some("origin")).await.unwrap();
        assert!(out.ok, "{}", out.output);
        assert!(out.output.starts_with("Successfully pushed to origin/main"));
        assert_eq!(git.commits(&root, "main"), vec!["docs"]);
        assert_eq!(git.pushes(&root), vec![("origin".to_string(), "main".to_string())]);
    }

    #[tokio::test]
    async fn commit_without_remote_skips_push() {
        let (git, root) = setup();
        git.edit(&root, "a.txt", "a");
        let repo = Repo::new(&git, &root);

        let out = repo.commit("local only", "main", None).await.unwrap();
        assert!(out.ok);
        assert!(git.pushes(&root).is_empty());
    }

    #[tokio::test]
    async fn failed_push_is_reported() {
        let (git, root) = setup();
        git.edit(&root, "a.txt", "a");
        git.fail_command(&["push"]);
        let repo = Repo::new(&git, &root);

        let out = repo.commit("msg", "main", Some("origin")).await.unwrap();
        assert!(!out.ok);
        assert!(out.output.starts_with("Committed, but push to origin/main failed"));
        assert_eq!(git.commits(&root, "main"), vec!["msg"]);
    }

    #[tokio::test]
    async fn status_lists_changes() {
        let (git, root) = setup();
        git.edit(&root, "new.txt", "x");
        let repo = Repo::new(&git, &root);

        let out = repo.status().await.unwrap();
        assert!(out.ok);
        assert_eq!(out.trimmed(), "?? new.txt");
    }

    #[tokio::test]
    async fn stash_save_then_pop() {
        let (git, root) = setup();
        git.edit(&root, "wip.txt", "x");
        let repo = Repo::new(&git, &root);

        assert!(repo.stash_save().await.unwrap().ok);
        assert!(git.changes(&root).is_empty());
        assert_eq!(git.stash_messages(&root), vec![REMOTE_STASH_MESSAGE]);

        assert!(repo.stash_pop().await.unwrap().ok);
        assert_eq!(git.changes(&root).len(), 1);
    }

    #[tokio::test]
    async fn reset_discards_tracked_changes() {
        let (git, root) = setup();
        git.track(&root, "tracked.txt");
        git.edit(&root, "tracked.txt", "changed");
        git.edit(&root, "untracked.txt", "x");
        let repo = Repo::new(&git, &root);

        assert!(repo.reset_hard().await.unwrap().ok);
        assert_eq!(git.changes(&root).keys().collect::<Vec<_>>(), vec!["untracked.txt"]);
    }
}
