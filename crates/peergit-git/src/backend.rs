//! Version-control backend seam and the `git` CLI implementation.

use crate::{GitError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Combined output of one version-control command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VcsOutput {
    /// Stdout followed by stderr.
    pub output: String,
    /// Whether the command exited successfully.
    pub ok: bool,
}

impl VcsOutput {
    /// A successful result carrying `output`.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ok: true,
        }
    }

    /// A failed result carrying `output`.
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ok: false,
        }
    }

    /// Output with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}

/// Runs version-control commands inside a repository root.
#[async_trait]
pub trait VcsBackend: Send + Sync + 'static {
    /// Runs the tool with `args` in `root`.
    ///
    /// Returns `Err` only when the command could not be run at all.
    async fn run(&self, root: &Path, args: &[&str]) -> Result<VcsOutput>;
}

/// Backend that shells out to the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Uses the given git executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the configured executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl VcsBackend for GitCli {
    async fn run(&self, root: &Path, args: &[&str]) -> Result<VcsOutput> {
        tracing::debug!(root = %root.display(), args = ?args, "Running git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let ok = output.status.success();
        if !ok {
            tracing::debug!(
                root = %root.display(),
                args = ?args,
                code = ?output.status.code(),
                "git exited with failure"
            );
        }

        Ok(VcsOutput {
            output: combined,
            ok,
        })
    }
}
