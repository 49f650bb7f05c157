//! In-memory git model for tests.

use crate::{Result, VcsBackend, VcsOutput};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Root the command ran in.
    pub root: PathBuf,
    /// Arguments after the program name.
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct FakeStash {
    branch: String,
    message: String,
    changes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct FakeRepo {
    current: String,
    branches: BTreeMap<String, Vec<String>>,
    tracked: BTreeSet<String>,
    changes: BTreeMap<String, String>,
    // Index 0 is the most recent entry, as in `git stash list`.
    stashes: Vec<FakeStash>,
    pushes: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct Concurrency {
    total: usize,
    peak_total: usize,
    per_root: HashMap<PathBuf, usize>,
    peak_per_root: HashMap<PathBuf, usize>,
}

/// A [`VcsBackend`] that models branches, a working tree and the stash list.
///
/// Only the commands the daemon issues are understood. Working-tree changes
/// are injected with [`FakeGit::edit`]; uncommitted changes follow checkouts
/// the way they do in git.
#[derive(Debug, Default)]
pub struct FakeGit {
    repos: Mutex<HashMap<PathBuf, FakeRepo>>,
    invocations: Mutex<Vec<Invocation>>,
    failures: Mutex<Vec<Vec<String>>>,
    concurrency: Mutex<Concurrency>,
    delay: Option<Duration>,
}

impl FakeGit {
    /// Creates a backend with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Creates a repository at `root` with `branch` checked out.
    pub fn init_repo(&self, root: &Path, branch: &str) {
        let mut repo = FakeRepo {
            current: branch.to_string(),
            ..FakeRepo::default()
        };
        repo.branches.insert(branch.to_string(), Vec::new());
        self.repos.lock().insert(root.to_path_buf(), repo);
    }

    /// Adds a branch pointing where the current branch points.
    pub fn add_branch(&self, root: &Path, branch: &str) {
        self.with_repo(root, |repo| {
            let commits = repo.branches.get(&repo.current).cloned().unwrap_or_default();
            repo.branches.insert(branch.to_string(), commits);
        });
    }

    /// Marks `path` as tracked.
    pub fn track(&self, root: &Path, path: &str) {
        self.with_repo(root, |repo| {
            repo.tracked.insert(path.to_string());
        });
    }

    /// Records an uncommitted change to `path`.
    pub fn edit(&self, root: &Path, path: &str, content: &str) {
        self.with_repo(root, |repo| {
            repo.changes.insert(path.to_string(), content.to_string());
        });
    }

    /// Makes every later call whose arguments start with `prefix` fail.
    pub fn fail_command(&self, prefix: &[&str]) {
        self.failures
            .lock()
            .push(prefix.iter().map(ToString::to_string).collect());
    }

    /// The checked-out branch.
    #[must_use]
    pub fn current_branch(&self, root: &Path) -> String {
        self.with_repo(root, |repo| repo.current.clone())
    }

    /// Uncommitted changes, path to content.
    #[must_use]
    pub fn changes(&self, root: &Path) -> BTreeMap<String, String> {
        self.with_repo(root, |repo| repo.changes.clone())
    }

    /// Stash messages, most recent first.
    #[must_use]
    pub fn stash_messages(&self, root: &Path) -> Vec<String> {
        self.with_repo(root, |repo| {
            repo.stashes.iter().map(|s| s.message.clone()).collect()
        })
    }

    /// Commit messages on `branch`, oldest first.
    #[must_use]
    pub fn commits(&self, root: &Path, branch: &str) -> Vec<String> {
        self.with_repo(root, |repo| {
            repo.branches.get(branch).cloned().unwrap_or_default()
        })
    }

    /// `(remote, branch)` pairs pushed so far.
    #[must_use]
    pub fn pushes(&self, root: &Path) -> Vec<(String, String)> {
        self.with_repo(root, |repo| repo.pushes.clone())
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Highest number of calls that were in flight at once, across all roots.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.concurrency.lock().peak_total
    }

    /// Highest number of calls that were in flight at once against `root`.
    #[must_use]
    pub fn peak_concurrency_for(&self, root: &Path) -> usize {
        self.concurrency
            .lock()
            .peak_per_root
            .get(root)
            .copied()
            .unwrap_or(0)
    }

    fn with_repo<T>(&self, root: &Path, f: impl FnOnce(&mut FakeRepo) -> T) -> T {
        let mut repos = self.repos.lock();
        f(repos.entry(root.to_path_buf()).or_default())
    }

    fn enter(&self, root: &Path) {
        let mut c = self.concurrency.lock();
        c.total += 1;
        c.peak_total = c.peak_total.max(c.total);
        let now = {
            let n = c.per_root.entry(root.to_path_buf()).or_default();
            *n += 1;
            *n
        };
        let peak = c.peak_per_root.entry(root.to_path_buf()).or_default();
        *peak = (*peak).max(now);
    }

    fn leave(&self, root: &Path) {
        let mut c = self.concurrency.lock();
        c.total -= 1;
        if let Some(n) = c.per_root.get_mut(root) {
            *n -= 1;
        }
    }

    fn should_fail(&self, args: &[&str]) -> bool {
        self.failures.lock().iter().any(|prefix| {
            prefix.len() <= args.len() && prefix.iter().zip(args).all(|(p, a)| p == a)
        })
    }

    fn execute(&self, root: &Path, args: &[&str]) -> VcsOutput {
        if self.should_fail(args) {
            return VcsOutput::failure(format!("fatal: injected failure for '{}'", args.join(" ")));
        }

        let mut repos = self.repos.lock();
        let Some(repo) = repos.get_mut(root) else {
            return VcsOutput::failure(
                "fatal: not a git repository (or any of the parent directories): .git\n",
            );
        };

        // Paths follow a `--` separator when one is present.
        let paths: Vec<&str> = match args.iter().position(|a| *a == "--") {
            Some(i) => args[i + 1..].to_vec(),
            None => Vec::new(),
        };

        match args {
            ["rev-parse", "--abbrev-ref", "HEAD"] => VcsOutput::success(format!("{}\n", repo.current)),
            ["branch", "--format=%(refname:short)"] => {
                let mut out = String::new();
                for name in repo.branches.keys() {
                    out.push_str(name);
                    out.push('\n');
                }
                VcsOutput::success(out)
            }
            ["branch", name] => {
                if repo.branches.contains_key(*name) {
                    return VcsOutput::failure(format!("fatal: a branch named '{name}' already exists\n"));
                }
                let commits = repo.branches.get(&repo.current).cloned().unwrap_or_default();
                repo.branches.insert((*name).to_string(), commits);
                VcsOutput::success("")
            }
            ["checkout", name] => {
                if !repo.branches.contains_key(*name) {
                    return VcsOutput::failure(format!(
                        "error: pathspec '{name}' did not match any file(s) known to git\n"
                    ));
                }
                repo.current = (*name).to_string();
                VcsOutput::success(format!("Switched to branch '{name}'\n"))
            }
            ["stash", "push", "--include-untracked", "-m", message] => {
                if repo.changes.is_empty() {
                    return VcsOutput::success("No local changes to save\n");
                }
                let stash = FakeStash {
                    branch: repo.current.clone(),
                    message: (*message).to_string(),
                    changes: std::mem::take(&mut repo.changes),
                };
                let out = format!("Saved working directory and index state On {}: {}\n", stash.branch, stash.message);
                repo.stashes.insert(0, stash);
                VcsOutput::success(out)
            }
            ["stash", "list"] => {
                let mut out = String::new();
                for (i, stash) in repo.stashes.iter().enumerate() {
                    out.push_str(&format!("stash@{{{i}}}: On {}: {}\n", stash.branch, stash.message));
                }
                VcsOutput::success(out)
            }
            ["stash", "pop", rest @ ..] => {
                let index = match rest {
                    [] => 0,
                    [reference] => match parse_stash_ref(reference) {
                        Some(i) => i,
                        None => return VcsOutput::failure(format!("error: {reference} is not a valid reference\n")),
                    },
                    _ => return VcsOutput::failure("error: too many arguments\n"),
                };
                if index >= repo.stashes.len() {
                    return VcsOutput::failure("No stash entries found.\n");
                }
                let stash = repo.stashes.remove(index);
                repo.changes.extend(stash.changes);
                VcsOutput::success(format!("Dropped refs/stash@{{{index}}}\n"))
            }
            ["add", ..] => VcsOutput::success(""),
            ["commit", "-m", message] => {
                if repo.changes.is_empty() {
                    return VcsOutput::failure(format!(
                        "On branch {}\nnothing to commit, working tree clean\n",
                        repo.current
                    ));
                }
                let count = repo.changes.len();
                let changed = std::mem::take(&mut repo.changes);
                repo.tracked.extend(changed.into_keys());
                let current = repo.current.clone();
                repo.branches
                    .entry(current.clone())
                    .or_default()
                    .push((*message).to_string());
                VcsOutput::success(format!("[{current}] {message}\n {count} file(s) changed\n"))
            }
            ["push", remote, branch] => {
                repo.pushes.push(((*remote).to_string(), (*branch).to_string()));
                VcsOutput::success(format!("To {remote}\n   {branch} -> {branch}\n"))
            }
            ["status", "--porcelain"] => {
                let mut out = String::new();
                for path in repo.changes.keys() {
                    let code = if repo.tracked.contains(path) { " M" } else { "??" };
                    out.push_str(&format!("{code} {path}\n"));
                }
                VcsOutput::success(out)
            }
            ["log", ..] => {
                let commits = repo.branches.get(&repo.current).cloned().unwrap_or_default();
                if commits.is_empty() {
                    return VcsOutput::failure(format!(
                        "fatal: your current branch '{}' does not have any commits yet\n",
                        repo.current
                    ));
                }
                let mut out = String::new();
                for (i, message) in commits.iter().enumerate().rev() {
                    out.push_str(&format!("* {i:07x} - {message}\n"));
                }
                VcsOutput::success(out)
            }
            ["diff", ..] => {
                let mut out = String::new();
                for (path, content) in &repo.changes {
                    if !repo.tracked.contains(path) || (!paths.is_empty() && !paths.contains(&path.as_str())) {
                        continue;
                    }
                    out.push_str(&format!("diff --git a/{path} b/{path}\n+{content}\n"));
                }
                VcsOutput::success(out)
            }
            ["reset", "--hard", "HEAD"] => {
                let tracked = &repo.tracked;
                repo.changes.retain(|path, _| !tracked.contains(path));
                VcsOutput::success("HEAD is now at 0000000\n")
            }
            ["ls-files", "--error-unmatch", ..] => match paths.first() {
                Some(path) if repo.tracked.contains(*path) => VcsOutput::success(format!("{path}\n")),
                _ => VcsOutput::failure(format!(
                    "error: pathspec '{}' did not match any file(s) known to git\n",
                    paths.first().unwrap_or(&"")
                )),
            },
            ["mv", ..] => {
                let [old, new] = paths.as_slice() else {
                    return VcsOutput::failure("usage: git mv [<options>] <source>... <destination>\n");
                };
                if !repo.tracked.remove(*old) {
                    return VcsOutput::failure(format!("fatal: not under version control, source={old}\n"));
                }
                repo.tracked.insert((*new).to_string());
                if let Some(content) = repo.changes.remove(*old) {
                    repo.changes.insert((*new).to_string(), content);
                }
                VcsOutput::success("")
            }
            _ => VcsOutput::failure(format!("git: '{}' is not modelled by FakeGit\n", args.join(" "))),
        }
    }
}

fn parse_stash_ref(reference: &str) -> Option<usize> {
    reference
        .strip_prefix("stash@{")?
        .strip_suffix('}')?
        .parse()
        .ok()
}

#[async_trait]
impl VcsBackend for FakeGit {
    async fn run(&self, root: &Path, args: &[&str]) -> Result<VcsOutput> {
        self.invocations.lock().push(Invocation {
            root: root.to_path_buf(),
            args: args.iter().map(ToString::to_string).collect(),
        });

        self.enter(root);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let out = self.execute(root, args);
        self.leave(root);

        Ok(out)
    }
}
