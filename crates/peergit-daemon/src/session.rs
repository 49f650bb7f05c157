//! One request per stream.

use crate::router;
use crate::Approver;
use peergit_git::{RepoLocks, VcsBackend};
use peergit_identity::PeerId;
use peergit_protocol::{read_message, ProtocolError, RequestKind, ResponseKind};
use peergit_store::{RepoRegistry, TrustStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A response of this kind was written.
    Responded(ResponseKind),
    /// The peer closed the stream before sending a request.
    Disconnected,
    /// The stream was closed without a response.
    ProtocolViolation(String),
}

/// Shared daemon state and the entry point for every inbound stream.
pub struct SessionHandler {
    trust: TrustStore,
    registry: RepoRegistry,
    locks: RepoLocks,
    backend: Arc<dyn VcsBackend>,
    approver: Arc<dyn Approver>,
    push_remote: Option<String>,
}

impl SessionHandler {
    /// Creates a handler. Commits are pushed to `origin` unless changed with
    /// [`with_push_remote`](Self::with_push_remote).
    pub fn new(
        trust: TrustStore,
        registry: RepoRegistry,
        backend: Arc<dyn VcsBackend>,
        approver: Arc<dyn Approver>,
    ) -> Self {
        Self {
            trust,
            registry,
            locks: RepoLocks::new(),
            backend,
            approver,
            push_remote: Some("origin".to_string()),
        }
    }

    /// Sets the remote commits are pushed to; `None` disables pushing.
    #[must_use]
    pub fn with_push_remote(mut self, remote: Option<String>) -> Self {
        self.push_remote = remote;
        self
    }

    /// The trust store.
    #[must_use]
    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// The repository registry.
    #[must_use]
    pub fn registry(&self) -> &RepoRegistry {
        &self.registry
    }

    pub(crate) fn locks(&self) -> &RepoLocks {
        &self.locks
    }

    pub(crate) fn approver(&self) -> &dyn Approver {
        self.approver.as_ref()
    }

    pub(crate) fn backend(&self) -> &dyn VcsBackend {
        self.backend.as_ref()
    }

    pub(crate) fn push_remote(&self) -> Option<&str> {
        self.push_remote.as_deref()
    }

    /// Resolves `alias`, describing the known aliases when it is unknown.
    pub(crate) fn resolve(&self, alias: &str) -> Result<PathBuf, String> {
        self.registry.resolve(alias).ok_or_else(|| {
            let known = self.registry.aliases();
            let known = if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            };
            format!("unknown repository alias '{alias}'. Known aliases: {known}")
        })
    }

    /// Reads one request from `stream`, answers it, and closes the write half.
    ///
    /// Untrusted peers may only send a handshake; anything else is dropped
    /// without a response, as are malformed envelopes and unknown tags.
    pub async fn handle<S>(&self, peer: PeerId, stream: &mut S) -> SessionOutcome
    where
        S: AsyncBufRead + AsyncWrite + Unpin + Send + ?Sized,
    {
        let envelope = match read_message(stream).await {
            Ok(envelope) => envelope,
            Err(ProtocolError::Closed) => {
                tracing::debug!(peer = %peer.short_id(), "Stream closed before a request");
                return SessionOutcome::Disconnected;
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!(peer = %peer.short_id(), error = %e, "Stream dropped before a request");
                return SessionOutcome::Disconnected;
            }
            Err(e) => return violation(peer, e.to_string()),
        };

        let routed = match envelope.request_kind() {
            Some(kind) if kind == RequestKind::Handshake || self.trust.is_trusted(&peer) => {
                router::dispatch(self, peer, kind, &envelope).await
            }
            Some(_) => return violation(peer, format!("untrusted peer sent {}", envelope.kind)),
            None if self.trust.is_trusted(&peer) => {
                return violation(peer, format!("unknown message type '{}'", envelope.kind))
            }
            None => return violation(peer, format!("untrusted peer sent '{}'", envelope.kind)),
        };

        let routed = match routed {
            Ok(routed) => routed,
            Err(e) => return violation(peer, format!("failed to encode response: {e}")),
        };

        if let Err(e) = write_reply(stream, &routed.frame).await {
            tracing::debug!(peer = %peer.short_id(), error = %e, "Peer left before the response");
            return SessionOutcome::Disconnected;
        }
        stream.shutdown().await.ok();

        tracing::info!(
            peer = %peer.short_id(),
            request = %envelope.kind,
            success = routed.success,
            "Handled request"
        );
        SessionOutcome::Responded(routed.kind)
    }
}

async fn write_reply<S>(stream: &mut S, frame: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    stream.write_all(frame).await?;
    stream.flush().await
}

impl std::fmt::Debug for SessionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandler")
            .field("trusted_peers", &self.trust.len())
            .field("repos", &self.registry.len())
            .field("push_remote", &self.push_remote)
            .finish_non_exhaustive()
    }
}

fn violation(peer: PeerId, reason: String) -> SessionOutcome {
    tracing::warn!(peer = %peer.short_id(), reason = %reason, "Closing stream without response");
    SessionOutcome::ProtocolViolation(reason)
}
