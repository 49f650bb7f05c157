//! Ed25519 keypair for signing.

use crate::{IdentityError, PublicKey, Result, Signature};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// An Ed25519 keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a new random keypair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Creates a keypair from a secret key (32 bytes).
    ///
    /// # Errors
    ///
    /// Returns an error if the secret key is not 32 bytes long.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(IdentityError::InvalidSecretKey);
        }

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(bytes);

        let signing_key = SigningKey::from_bytes(&secret);
        Ok(Self { signing_key })
    }

    /// Creates a keypair from a hex-encoded secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or has the wrong length.
    pub fn from_secret_hex(hex_secret: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(hex_secret.trim()).map_err(|_| IdentityError::InvalidSecretKey)?,
        );
        Self::from_secret_bytes(&bytes)
    }

    /// Returns the public key for this keypair.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Signs a message with this keypair.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature::from_bytes(sig.to_bytes())
    }

    /// Returns the secret key bytes.
    ///
    /// # Security
    ///
    /// Handle with care. The returned bytes are zeroized on drop.
    #[must_use]
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Returns the secret key as lowercase hex.
    #[must_use]
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&*self.secret_bytes()))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}
