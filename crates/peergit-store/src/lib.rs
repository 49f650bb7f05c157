//! # Peergit Store
//!
//! The daemon's two pieces of shared, persisted state:
//!
//! - [`TrustStore`]: the set of peers allowed to run commands.
//! - [`RepoRegistry`]: repository aliases and the directories they point to.
//!
//! Both are safe to share across sessions behind an `Arc`. Reads take a shared
//! lock; every mutation takes the exclusive lock, rewrites the backing JSON
//! document, and only then releases the lock, so what is on disk never lags
//! behind what a concurrent reader can observe.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod persist;
mod registry;
mod trust;

pub use error::{Result, StoreError};
pub use registry::{clean_path, parse_link_spec, RepoRegistry};
pub use trust::TrustStore;

/// Default file name of the trust store inside the data directory.
pub const TRUST_STORE_FILE: &str = "trusted_peers.json";

/// Default file name of the repository registry inside the data directory.
pub const REGISTRY_FILE: &str = "linked_repos.json";
