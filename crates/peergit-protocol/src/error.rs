//! Protocol error types.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The stream ended before any byte of a message arrived.
    ///
    /// This is how a peer abandoning a session looks; callers should treat it
    /// as a benign disconnect rather than a failure.
    #[error("stream closed before a message arrived")]
    Closed,

    /// Bytes arrived but they are not a valid message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The message exceeds size limits.
    #[error("message too large: more than {max} bytes")]
    TooLarge {
        /// The maximum allowed size.
        max: usize,
    },

    /// The peer speaks an incompatible protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// A message of a different type than the one expected arrived.
    #[error("unexpected message type: expected {expected}, got {actual}")]
    UnexpectedKind {
        /// The tag the caller was waiting for.
        expected: String,
        /// The tag that arrived.
        actual: String,
    },

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns true if this error only means the peer went away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
