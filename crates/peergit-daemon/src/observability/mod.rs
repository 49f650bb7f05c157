//! # Observability
//!
//! Structured logging for the daemon. Every crate logs through `tracing`
//! with structured fields; this module only installs the subscriber.

mod logging;

pub use logging::{init_logging, LogFormat};
