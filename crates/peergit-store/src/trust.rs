//! Persisted set of trusted peers.

use crate::{persist, Result};
use parking_lot::RwLock;
use peergit_identity::PeerId;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Thread-safe set of peers allowed past the handshake.
///
/// On disk this is a JSON array of hex-encoded peer ids. Membership only ever
/// grows; there is no revocation short of editing the file while the daemon
/// is stopped.
#[derive(Debug)]
pub struct TrustStore {
    path: PathBuf,
    peers: RwLock<BTreeSet<PeerId>>,
}

impl TrustStore {
    /// Loads the trust store at `path`, starting empty if the file is absent.
    ///
    /// Entries that do not parse as peer ids are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: Vec<String> = persist::load(&path)?.unwrap_or_default();

        let mut peers = BTreeSet::new();
        for entry in entries {
            match entry.parse::<PeerId>() {
                Ok(peer) => {
                    peers.insert(peer);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), entry = %entry, error = %e, "Skipping invalid trust entry");
                }
            }
        }

        tracing::debug!(path = %path.display(), count = peers.len(), "Loaded trust store");

        Ok(Self {
            path,
            peers: RwLock::new(peers),
        })
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `peer` has been approved.
    #[must_use]
    pub fn is_trusted(&self, peer: &PeerId) -> bool {
        self.peers.read().contains(peer)
    }

    /// Adds `peer` and persists the set.
    ///
    /// Returns `Ok(false)` without touching the file when the peer was already
    /// trusted. If the write fails the peer is removed again and the error is
    /// returned, so memory and disk agree.
    pub fn trust(&self, peer: PeerId) -> Result<bool> {
        let mut peers = self.peers.write();
        if !peers.insert(peer) {
            return Ok(false);
        }

        let entries: Vec<String> = peers.iter().map(ToString::to_string).collect();
        if let Err(e) = persist::save(&self.path, &entries) {
            peers.remove(&peer);
            return Err(e);
        }

        tracing::info!(peer = %peer.short_id(), total = peers.len(), "Peer trusted");
        Ok(true)
    }

    /// Returns the trusted peers in a stable order.
    #[must_use]
    pub fn peers(&self) -> Vec<PeerId> {
        self.peers.read().iter().copied().collect()
    }

    /// Returns the number of trusted peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Returns true if no peer is trusted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peergit_identity::Keypair;
    use pretty_assertions::assert_eq;

    fn peer() -> PeerId {
        PeerId::from(Keypair::generate().public_key())
    }

    #[test]
    fn starts_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::open(dir.path().join("trusted_peers.json")).unwrap();
        assert!(store.is_empty());
        assert!(!store.is_trusted(&peer()));
    }

    #[test]
    fn trust_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::open(dir.path().join("trusted_peers.json")).unwrap();
        let p = peer();

        assert!(store.trust(p).unwrap());
        assert!(!store.trust(p).unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.is_trusted(&p));
    }

    #[test]
    fn file_is_json_array_of_hex_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trusted_peers.json");
        let store = TrustStore::open(&path).unwrap();
        let p = peer();
        store.trust(p).unwrap();

        let raw: Vec<String> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, vec![p.to_string()]);
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trusted_peers.json");
        let p = peer();
        std::fs::write(&path, format!("[\"nonsense\", \"{p}\"]")).unwrap();

        let store = TrustStore::open(&path).unwrap();
        assert_eq!(store.peers(), vec![p]);
    }

    #[test]
    fn failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("trusted_peers.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();

        let store = TrustStore {
            path: path.clone(),
            peers: RwLock::new(BTreeSet::new()),
        };
        let p = peer();

        assert!(store.trust(p).is_err());
        assert!(!store.is_trusted(&p));
    }
}
