//! Stream authentication messages.

use peergit_identity::{Keypair, PublicKey, Signature};
use peergit_protocol::Version;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Domain separator mixed into every signed challenge.
pub const HELLO_DOMAIN: &[u8] = b"peergit-session-v1";

/// First frame on every stream, sent by the listening node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Protocol version of the node.
    pub version: Version,
    /// The node's public key.
    pub node: PublicKey,
    /// 32 random bytes, hex-encoded.
    pub nonce: String,
}

/// The dialer's answer to a [`Challenge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Protocol version of the dialer.
    pub version: Version,
    /// The dialer's public key.
    pub peer: PublicKey,
    /// Signature over [`Challenge::transcript`].
    pub signature: Signature,
}

impl Challenge {
    /// A fresh challenge from `node`.
    pub fn new(version: Version, node: PublicKey) -> Self {
        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self {
            version,
            node,
            nonce: hex::encode(nonce),
        }
    }

    /// Bytes the dialer signs: domain, nonce, then the node key.
    ///
    /// Binding the node key stops a proof made for one daemon from being
    /// replayed to another.
    #[must_use]
    pub fn transcript(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HELLO_DOMAIN.len() + self.nonce.len() + 32);
        out.extend_from_slice(HELLO_DOMAIN);
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(self.node.as_bytes());
        out
    }

    /// Signs this challenge as `keypair`.
    #[must_use]
    pub fn answer(&self, version: Version, keypair: &Keypair) -> Proof {
        Proof {
            version,
            peer: keypair.public_key(),
            signature: keypair.sign(&self.transcript()),
        }
    }

    /// Checks `proof` against this challenge.
    pub fn verify(&self, proof: &Proof) -> peergit_identity::Result<()> {
        proof.peer.verify(&self.transcript(), &proof.signature)
    }
}
