//! Persisted keypairs.
//!
//! A key file holds the hex-encoded 32-byte secret on a single line. It is
//! written once and reused on every start so the public key, and with it the
//! peer id other processes have trusted, never changes.

use crate::{IdentityError, Keypair, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Whether [`load_or_generate`] found an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The key was read from disk.
    Loaded,
    /// A new key was generated and written to disk.
    Generated,
}

fn key_file_error(path: &Path, source: std::io::Error) -> IdentityError {
    IdentityError::KeyFile {
        path: path.display().to_string(),
        source,
    }
}

/// Loads the keypair stored at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid key.
pub fn load(path: &Path) -> Result<Keypair> {
    let contents = zeroize::Zeroizing::new(
        fs::read_to_string(path).map_err(|e| key_file_error(path, e))?,
    );
    Keypair::from_secret_hex(&contents)
}

/// Writes `keypair` to `path`, creating parent directories.
///
/// On Unix the file is created with mode `0600`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save(path: &Path, keypair: &Keypair) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| key_file_error(path, e))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let write = |file: &mut fs::File| -> std::io::Result<()> {
        file.write_all(keypair.secret_hex().as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()
    };

    let mut file = options.open(path).map_err(|e| key_file_error(path, e))?;
    write(&mut file).map_err(|e| key_file_error(path, e))
}

/// Loads the keypair at `path`, generating and saving a new one if the file
/// does not exist yet.
///
/// # Errors
///
/// Returns an error if an existing file is unreadable or malformed, or if a
/// new key cannot be written.
pub fn load_or_generate(path: &Path) -> Result<(Keypair, KeySource)> {
    if path.exists() {
        let keypair = load(path)?;
        tracing::info!(
            path = %path.display(),
            peer = %keypair.public_key().short_id(),
            "Loaded identity key"
        );
        return Ok((keypair, KeySource::Loaded));
    }

    let keypair = Keypair::generate();
    save(path, &keypair)?;
    tracing::info!(
        path = %path.display(),
        peer = %keypair.public_key().short_id(),
        "Generated new identity key"
    );
    Ok((keypair, KeySource::Generated))
}
