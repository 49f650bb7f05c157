//! Client home directory: identity key and saved daemons.

use crate::commands::{CliError, Result};
use peergit_identity::keyfile;
use peergit_identity::Keypair;
use peergit_p2p::PeerAddr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const IDENTITY_FILE: &str = "identity.key";
const CONFIG_FILE: &str = "config.yaml";

/// Saved daemons, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon name to address.
    pub daemons: BTreeMap<String, PeerAddr>,
}

/// The client's state directory, `~/.peergit` unless overridden.
#[derive(Debug, Clone)]
pub struct Home {
    dir: PathBuf,
}

impl Home {
    /// Uses `dir`, or `$HOME/.peergit` when `None`.
    pub fn resolve(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".peergit"))
                .ok_or_else(|| CliError::Config("cannot locate home directory; pass --home".into()))?,
        };
        Ok(Self { dir })
    }

    /// The directory itself.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the client identity, creating one on first use.
    pub fn keypair(&self) -> Result<Keypair> {
        let (keypair, _) = keyfile::load_or_generate(&self.dir.join(IDENTITY_FILE))?;
        Ok(keypair)
    }

    /// Reads the saved daemons; a missing file is an empty configuration.
    pub fn config(&self) -> Result<ClientConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ClientConfig::default()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(ClientConfig::default());
        }
        serde_yaml::from_str(&text).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    /// Writes the saved daemons.
    pub fn save_config(&self, config: &ClientConfig) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let text = serde_yaml::to_string(config).map_err(|e| CliError::Config(e.to_string()))?;
        std::fs::write(self.dir.join(CONFIG_FILE), text)?;
        Ok(())
    }

    /// Resolves a saved daemon name, or parses `name` as a literal
    /// `<peer id>@<host:port>`.
    pub fn daemon(&self, name: &str) -> Result<PeerAddr> {
        if let Some(addr) = self.config()?.daemons.get(name) {
            return Ok(addr.clone());
        }
        if name.contains('@') {
            return Ok(name.parse()?);
        }
        Err(CliError::UnknownDaemon(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peergit_identity::PeerId;
    use pretty_assertions::assert_eq;

    fn addr() -> PeerAddr {
        PeerAddr::new(PeerId::from(Keypair::generate().public_key()), "10.0.0.2:4001")
    }

    #[test]
    fn missing_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::resolve(Some(dir.path().join("peergit"))).unwrap();
        assert_eq!(home.config().unwrap(), ClientConfig::default());
    }

    #[test]
    fn saved_daemons_resolve_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::resolve(Some(dir.path().to_path_buf())).unwrap();
        let laptop = addr();

        let mut config = ClientConfig::default();
        config.daemons.insert("laptop".into(), laptop.clone());
        home.save_config(&config).unwrap();

        assert_eq!(home.config().unwrap(), config);
        assert_eq!(home.daemon("laptop").unwrap(), laptop);
    }

    #[test]
    fn literal_address_needs_no_saving() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::resolve(Some(dir.path().to_path_buf())).unwrap();
        let literal = addr();

        assert_eq!(home.daemon(&literal.to_string()).unwrap(), literal);
        assert!(matches!(home.daemon("desktop"), Err(CliError::UnknownDaemon(_))));
        assert!(home.daemon("nobody@nowhere").is_err());
    }

    #[test]
    fn identity_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::resolve(Some(dir.path().to_path_buf())).unwrap();

        let first = home.keypair().unwrap().public_key();
        let second = home.keypair().unwrap().public_key();
        assert_eq!(first, second);
    }
}
