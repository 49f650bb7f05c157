//! # Peergit Protocol
//!
//! Wire protocol for peergit sessions.
//!
//! A session is one transport stream carrying exactly one request
//! [`Envelope`] and at most one response envelope. Envelopes are JSON objects
//! of the form `{"type": <tag>, "payload": <object>}`, framed by a trailing
//! newline (see [`codec`]).
//!
//! On top of the untyped envelope, every request payload implements [`Rpc`],
//! naming its [`RequestKind`] and its response type. This keeps the
//! one-request/one-response pairing checked at compile time on both sides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod error;
mod messages;
mod payloads;
mod version;

pub use codec::{read_frame, read_message, write_frame, write_message, MAX_MESSAGE_SIZE};
pub use error::{ProtocolError, Result};
pub use messages::{Envelope, Reply, RequestKind, ResponseKind, Rpc};
pub use payloads::*;
pub use version::{Version, PROTOCOL_VERSION};

/// Protocol identifier advertised by daemons.
pub const PROTOCOL_ID: &str = "/peergit/1.0.0";
