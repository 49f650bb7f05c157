//! P2P error types.

use peergit_identity::PeerId;
use thiserror::Error;

/// Errors that can occur while opening or using a peer stream.
#[derive(Debug, Error)]
pub enum P2pError {
    /// The address is not `<peer id>@<host:port>`.
    #[error("invalid peer address '{0}': expected <peer id>@<host:port>")]
    InvalidAddress(String),

    /// The remote failed to prove its identity.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The daemon answered with a different key than the address names.
    #[error("connected to {actual:?} but expected {expected:?}")]
    WrongPeer {
        /// Peer named by the address.
        expected: PeerId,
        /// Peer that answered.
        actual: PeerId,
    },

    /// The remote speaks an incompatible protocol version.
    #[error("incompatible protocol version {0}")]
    IncompatibleVersion(String),

    /// The authentication exchange did not finish in time.
    #[error("timed out during {0}")]
    Timeout(&'static str),

    /// The daemon closed the stream without sending a response.
    #[error("daemon closed the stream without a response")]
    NoResponse,

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] peergit_protocol::ProtocolError),

    /// Identity error.
    #[error("identity error: {0}")]
    Identity(#[from] peergit_identity::IdentityError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for P2P operations.
pub type Result<T> = std::result::Result<T, P2pError>;
