//! Operator approval of new peers.

use async_trait::async_trait;
use peergit_identity::PeerId;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Decides whether an untrusted peer may become trusted.
///
/// Implementations may block for as long as a human needs; only the
/// requesting session waits.
#[async_trait]
pub trait Approver: Send + Sync + 'static {
    /// Returns true to trust `peer`.
    async fn approve(&self, peer: &PeerId) -> bool;
}

/// Asks on the daemon's terminal.
///
/// Concurrent requests are prompted one at a time. End of input counts as a
/// refusal.
#[derive(Debug, Default)]
pub struct TerminalApprover {
    prompt: tokio::sync::Mutex<()>,
}

impl TerminalApprover {
    /// Creates a terminal approver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Approver for TerminalApprover {
    async fn approve(&self, peer: &PeerId) -> bool {
        let _turn = self.prompt.lock().await;
        let peer = *peer;

        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "\nIncoming handshake from peer {peer}").ok();
            write!(stdout, "Trust this peer? [y/N]: ").ok();
            stdout.flush().ok();

            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await;

        match answer {
            Ok(Some(line)) => is_yes(&line),
            Ok(None) => {
                tracing::warn!(peer = %peer.short_id(), "No answer on stdin; refusing peer");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Approval prompt failed");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Gives the same answer to every peer and counts how often it was asked.
#[derive(Debug)]
pub struct StaticApprover {
    approve: bool,
    asked: AtomicUsize,
}

impl StaticApprover {
    /// Approves everyone.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            approve: true,
            asked: AtomicUsize::new(0),
        }
    }

    /// Refuses everyone.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            approve: false,
            asked: AtomicUsize::new(0),
        }
    }

    /// Number of decisions requested so far.
    #[must_use]
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Approver for StaticApprover {
    async fn approve(&self, peer: &PeerId) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(peer = %peer.short_id(), approve = self.approve, "Static approval");
        self.approve
    }
}
