//! # Peergit Daemon
//!
//! Serves linked git working copies to trusted peers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Peergit Daemon                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  Node (peergit-p2p)        one authenticated stream each │
//! │         │                                                │
//! │  SessionHandler            read one envelope, trust gate │
//! │         │                                                │
//! │  router ─► handlers        files, branches, commit, ...  │
//! │         │                                                │
//! │  RepoLocks ─► Repo ─► VcsBackend (git)                   │
//! │                                                          │
//! │  TrustStore, RepoRegistry  (peergit-store, JSON on disk) │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A peer that is not in the trust store may only send a handshake. The
//! operator decides through an [`Approver`]; approved peers are persisted.
//! Everything else a trusted peer sends is answered with a structured
//! response, including failures. Requests on the same repository run one at a
//! time; requests on different repositories run in parallel.
//!
//! ## Modules
//!
//! - [`config`] - YAML configuration with defaults
//! - [`handshake`] - Trust-gating state machine
//! - [`paths`] - Confinement of peer paths to a repository root
//! - [`observability`] - Logging setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod approver;
pub mod config;
mod daemon;
mod error;
mod handlers;
pub mod handshake;
pub mod observability;
pub mod paths;
mod router;
mod session;

pub use approver::{Approver, StaticApprover, TerminalApprover};
pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::{DaemonError, Result};
pub use handshake::{run_handshake, HandshakeState};
pub use observability::{init_logging, LogFormat};
pub use paths::{confine, ConfinedPath, PathError};
pub use session::{SessionHandler, SessionOutcome};
