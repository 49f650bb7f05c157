//! Store error types.

use thiserror::Error;

/// Errors that can occur while loading or mutating persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A backing file does not hold the expected document.
    #[error("corrupt document {path}: {message}")]
    Corrupt {
        /// The file involved.
        path: String,
        /// What failed to parse.
        message: String,
    },

    /// The alias cannot be used.
    #[error("invalid alias '{0}': must be non-empty, without ':' or whitespace")]
    InvalidAlias(String),

    /// The path cannot be used as a repository root.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as given.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A specialized Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
