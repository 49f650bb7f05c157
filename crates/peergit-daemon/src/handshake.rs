//! Trust-gating handshake.
//!
//! A peer moves `Unknown → Pending → Trusted | Rejected` within a single
//! stream. Only the trusted outcome is remembered; a rejected peer can ask
//! again on a later stream.

use crate::{Approver, SessionHandler};
use peergit_identity::PeerId;
use peergit_protocol::HandshakeResponse;
use peergit_store::TrustStore;
use std::fmt;

/// Where a peer stands in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Not in the trust store and not yet asked about.
    Unknown,
    /// Waiting for the operator.
    Pending,
    /// In the trust store.
    Trusted,
    /// Refused, or trusted but the trust store could not be written.
    Rejected,
}

impl HandshakeState {
    /// Whether the peer should be told it was approved.
    #[must_use]
    pub fn is_approved(self) -> bool {
        self == Self::Trusted
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Pending => "pending",
            Self::Trusted => "trusted",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Runs the handshake for `peer` and returns its final state.
///
/// An already-trusted peer is answered without asking the operator.
pub async fn run_handshake(trust: &TrustStore, approver: &dyn Approver, peer: PeerId) -> HandshakeState {
    if trust.is_trusted(&peer) {
        tracing::debug!(peer = %peer.short_id(), "Handshake from already trusted peer");
        return HandshakeState::Trusted;
    }

    let mut state = HandshakeState::Unknown;
    transition(&mut state, HandshakeState::Pending, peer);

    let next = if approver.approve(&peer).await {
        match trust.trust(peer) {
            Ok(_) => HandshakeState::Trusted,
            Err(e) => {
                tracing::error!(peer = %peer.short_id(), error = %e, "Failed to persist trusted peer");
                HandshakeState::Rejected
            }
        }
    } else {
        HandshakeState::Rejected
    };
    transition(&mut state, next, peer);

    state
}

/// Answers a `HANDSHAKE_REQUEST` from `peer`.
pub(crate) async fn answer(ctx: &SessionHandler, peer: PeerId) -> HandshakeResponse {
    let state = run_handshake(ctx.trust(), ctx.approver(), peer).await;
    HandshakeResponse {
        approved: state.is_approved(),
    }
}

fn transition(state: &mut HandshakeState, next: HandshakeState, peer: PeerId) {
    tracing::info!(peer = %peer.short_id(), from = %state, to = %next, "Handshake");
    *state = next;
}
