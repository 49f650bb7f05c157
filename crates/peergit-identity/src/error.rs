//! Error types for identity operations.

use thiserror::Error;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The signature verification failed.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The public key is malformed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The secret key is malformed.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Reading or writing a key file failed.
    #[error("key file {path}: {source}")]
    KeyFile {
        /// The key file involved.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
