//! End-to-end checks against the real `git` binary.
//!
//! Skipped when `git` is not on the PATH.

use peergit_git::{switch_branch, GitCli, Repo, SwitchOutcome};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(root)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .unwrap();
    assert!(
        status.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&status.stderr)
    );
}

fn init_repo(root: &Path) {
    git(root, &["init", "-q"]);
    git(root, &["checkout", "-q", "-b", "main"]);
    git(root, &["config", "user.name", "Peergit Test"]);
    git(root, &["config", "user.email", "test@peergit.invalid"]);
    git(root, &["config", "commit.gpgsign", "false"]);
    fs::write(root.join("README.md"), "base\n").unwrap();
    git(root, &["add", "README.md"]);
    git(root, &["commit", "-q", "-m", "initial"]);
}

#[tokio::test]
async fn switch_round_trip_restores_uncommitted_work() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    init_repo(root);

    let cli = GitCli::default();
    let repo = Repo::new(&cli, root);

    assert_eq!(repo.current_branch().await.unwrap(), "main");
    let created = repo.create_branch("feature").await.unwrap();
    assert!(created.ok, "{}", created.output);

    fs::write(root.join("README.md"), "edited on main\n").unwrap();
    fs::write(root.join("scratch.txt"), "untracked\n").unwrap();

    let away = switch_branch(&repo, "feature").await.unwrap();
    assert_eq!(away, SwitchOutcome::NothingToRestore { branch: "feature".into() });
    assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "base\n");
    assert!(!root.join("scratch.txt").exists());

    let back = switch_branch(&repo, "main").await.unwrap();
    assert!(matches!(back, SwitchOutcome::Restored { .. }), "{back:?}");
    assert_eq!(
        fs::read_to_string(root.join("README.md")).unwrap(),
        "edited on main\n"
    );
    assert!(root.join("scratch.txt").exists());

    let again = switch_branch(&repo, "main").await.unwrap();
    assert_eq!(again, SwitchOutcome::AlreadyOnBranch { branch: "main".into() });
}

#[tokio::test]
async fn commit_status_and_clean_tree() {
    if !git_available() {
        eprintln!("git not found, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    init_repo(root);

    let cli = GitCli::default();
    let repo = Repo::new(&cli, root);

    assert_eq!(repo.status().await.unwrap().output, "Working tree is clean.");
    assert_eq!(repo.diff(None).await.unwrap().output, "No differences found.");

    fs::write(root.join("notes.txt"), "hello\n").unwrap();
    let status = repo.status().await.unwrap();
    assert!(status.output.contains("?? notes.txt"), "{}", status.output);

    let committed = repo.commit("add notes", "main", None).await.unwrap();
    assert!(committed.ok, "{}", committed.output);

    let clean = repo.commit("again", "main", None).await.unwrap();
    assert!(clean.ok);
    assert_eq!(clean.output, "Working tree is clean. Nothing to commit.");

    assert!(repo.is_tracked("notes.txt").await.unwrap());
    assert!(!repo.is_tracked("missing.txt").await.unwrap());

    let log = repo.log().await.unwrap();
    assert!(log.ok);
    assert!(log.output.contains("add notes"));
}
