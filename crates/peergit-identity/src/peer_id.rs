//! Peer identifiers.

use crate::{IdentityError, PublicKey, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The identity of a remote peer: the public half of its persisted keypair.
///
/// Stable across reconnects for as long as the peer keeps its key file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(PublicKey);

impl PeerId {
    /// Creates a peer ID from a public key.
    #[must_use]
    pub const fn from_public_key(key: PublicKey) -> Self {
        Self(key)
    }

    /// Returns the public key behind this id.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.0
    }

    /// Returns a short hex representation for logs.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.0.short_id()
    }
}

impl From<PublicKey> for PeerId {
    fn from(key: PublicKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.short_id())
    }
}

impl FromStr for PeerId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(Self)
    }
}

impl PartialOrd for PeerId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PeerId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypair;
    use pretty_assertions::assert_eq;

    #[test]
    fn peer_id_parses_its_display() {
        let peer = PeerId::from(Keypair::generate().public_key());
        let parsed: PeerId = peer.to_string().parse().unwrap();
        assert_eq!(parsed, peer);
        assert_eq!(format!("{peer:?}"), format!("PeerId({})", peer.short_id()));
    }

    #[test]
    fn peer_id_serializes_as_hex_string() {
        let peer = PeerId::from(Keypair::generate().public_key());
        let json = serde_json::to_string(&peer).unwrap();
        assert_eq!(json, format!("\"{peer}\""));
    }
}
