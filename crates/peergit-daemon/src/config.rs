//! Daemon configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the binary.

use crate::{DaemonError, LogFormat, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the peergit daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Transport listen address.
    pub listen_addr: SocketAddr,
    /// Directory holding the identity key, trust store and registry.
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Remote pushed to after each commit; `None` disables pushing.
    pub push_remote: Option<String>,
    /// Seconds a dialer has to complete the transport hello.
    pub hello_timeout_secs: u64,
    /// Refuse every handshake from a peer that is not already trusted.
    pub deny_new_peers: bool,
    /// Path or name of the git binary.
    pub git_program: PathBuf,
    /// Peer ids (hex public keys) trusted at startup.
    pub trusted_peers: Vec<String>,
    /// Repositories linked at startup, by alias.
    pub repos: BTreeMap<String, PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], peergit_p2p::DEFAULT_PORT)),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            push_remote: Some("origin".to_string()),
            hello_timeout_secs: peergit_p2p::DEFAULT_HELLO_TIMEOUT.as_secs(),
            deny_new_peers: false,
            git_program: PathBuf::from("git"),
            trusted_peers: Vec::new(),
            repos: BTreeMap::new(),
        }
    }
}

impl DaemonConfig {
    /// Reads a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            DaemonError::Config(message) => DaemonError::Config(format!("{}: {message}", path.display())),
            other => other,
        })
    }

    /// Parses YAML configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// The transport hello timeout.
    #[must_use]
    pub fn hello_timeout(&self) -> Duration {
        Duration::from_secs(self.hello_timeout_secs)
    }

    /// Path of the daemon's identity key.
    #[must_use]
    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join("identity.key")
    }
}
