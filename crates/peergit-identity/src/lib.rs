//! # Peergit Identity
//!
//! Ed25519 identities for peergit daemons and clients.
//!
//! Every process owns one [`Keypair`], persisted with [`keyfile`] so the
//! identity a peer presents stays stable across restarts. The public half is
//! what the daemon's trust store records.
//!
//! ## Example
//!
//! ```rust
//! use peergit_identity::Keypair;
//!
//! let keypair = Keypair::generate();
//! let signature = keypair.sign(b"challenge");
//! assert!(keypair.public_key().verify(b"challenge", &signature).is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod keyfile;
mod keypair;
mod peer_id;
mod public_key;
mod signature;

pub use error::{IdentityError, Result};
pub use keypair::Keypair;
pub use peer_id::PeerId;
pub use public_key::PublicKey;
pub use signature::Signature;
