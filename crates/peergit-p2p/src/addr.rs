//! Dialable peer addresses.

use crate::{P2pError, Result};
use peergit_identity::PeerId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A daemon's identity together with where to reach it.
///
/// Written as `<hex public key>@<host:port>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    /// The daemon's identity.
    pub peer: PeerId,
    /// `host:port` to connect to.
    pub addr: String,
}

impl PeerAddr {
    /// Pairs `peer` with a socket address.
    pub fn new(peer: PeerId, addr: impl Into<String>) -> Self {
        Self {
            peer,
            addr: addr.into(),
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.peer, self.addr)
    }
}

impl FromStr for PeerAddr {
    type Err = P2pError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || P2pError::InvalidAddress(s.to_string());

        let (peer, addr) = s.trim().split_once('@').ok_or_else(invalid)?;
        let peer: PeerId = peer.parse().map_err(|_| invalid())?;

        let valid_addr = addr
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid_addr {
            return Err(invalid());
        }

        Ok(Self::new(peer, addr))
    }
}

impl Serialize for PeerAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeerAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
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
    fn parses_display_form() {
        let addr = PeerAddr::new(peer(), "127.0.0.1:4001");
        let parsed: PeerAddr = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn accepts_hostnames_and_ipv6() {
        let p = peer();
        assert!(format!("{p}@example.com:4001").parse::<PeerAddr>().is_ok());
        assert!(format!("{p}@[::1]:4001").parse::<PeerAddr>().is_ok());
    }

    #[test]
    fn rejects_malformed() {
        let p = peer();
        for bad in [
            "127.0.0.1:4001".to_string(),
            format!("{p}@"),
            format!("{p}@host"),
            format!("{p}@host:notaport"),
            format!("{p}@:4001"),
            "deadbeef@127.0.0.1:4001".to_string(),
        ] {
            assert!(bad.parse::<PeerAddr>().is_err(), "{bad}");
        }
    }

    #[test]
    fn serializes_as_string() {
        let addr = PeerAddr::new(peer(), "10.0.0.2:4001");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: PeerAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
