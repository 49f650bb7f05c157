//! Daemon error types.

use thiserror::Error;

/// Errors that stop the daemon from starting or serving.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The configuration file or flags are unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// No repository is linked, so there is nothing to serve.
    #[error("no repositories linked; pass --repo <alias>:<path> or list them under `repos` in the config file")]
    NoRepositories,

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] peergit_store::StoreError),

    /// Identity error.
    #[error("identity error: {0}")]
    Identity(#[from] peergit_identity::IdentityError),

    /// P2P error.
    #[error("p2p error: {0}")]
    P2p(#[from] peergit_p2p::P2pError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for daemon operations.
pub type Result<T> = std::result::Result<T, DaemonError>;
