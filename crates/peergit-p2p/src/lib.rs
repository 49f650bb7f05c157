//! # Peergit P2P
//!
//! Authenticated peer streams over TCP.
//!
//! Every connection carries exactly one request and its response. Before the
//! request, the listening [`Node`] sends a random challenge and the dialer
//! signs it with its identity key, so the daemon always knows which
//! [`PeerId`](peergit_identity::PeerId) it is talking to. The dialer in turn
//! checks that the daemon's key matches the [`PeerAddr`] it dialled.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod addr;
mod client;
mod error;
mod hello;
mod node;

pub use addr::PeerAddr;
pub use client::Client;
pub use error::{P2pError, Result};
pub use hello::{Challenge, Proof, HELLO_DOMAIN};
pub use node::{dial, Incoming, Node, NodeConfig, PeerStream};

use std::time::Duration;

/// Default port daemons listen on.
pub const DEFAULT_PORT: u16 = 4001;

/// Default limit for the authentication exchange at the start of a stream.
pub const DEFAULT_HELLO_TIMEOUT: Duration = Duration::from_secs(10);
