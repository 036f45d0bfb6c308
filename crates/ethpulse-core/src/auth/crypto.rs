//! AES-256-GCM sealing of stored provider credentials.
//!
//! Blob layout: `hex(nonce ‖ ciphertext ‖ tag)` with a fresh random 96-bit nonce per seal.

use ring::{
    aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN},
    rand::{SecureRandom, SystemRandom},
};
use sha2::{Digest, Sha256};
use std::fmt;

use super::AuthError;

pub struct CredentialCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl CredentialCipher {
    /// Derives the 256-bit key as SHA-256 of `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encryption`] if the key cannot be constructed.
    pub fn from_secret(secret: &str) -> Result<Self, AuthError> {
        let digest = Sha256::digest(secret.as_bytes());
        Self::from_key_bytes(digest.as_slice())
    }

    /// Random key for processes started without a configured secret. Sessions sealed with it
    /// do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encryption`] if the system RNG fails.
    pub fn ephemeral() -> Result<Self, AuthError> {
        let mut bytes = [0u8; 32];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| AuthError::Encryption("system RNG unavailable".to_string()))?;
        Self::from_key_bytes(&bytes)
    }

    fn from_key_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        let unbound = UnboundKey::new(&AES_256_GCM, bytes)
            .map_err(|_| AuthError::Encryption("invalid key length".to_string()))?;
        Ok(Self { key: LessSafeKey::new(unbound), rng: SystemRandom::new() })
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Encryption`] if nonce generation or sealing fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, AuthError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| AuthError::Encryption("nonce generation failed".to_string()))?;

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| AuthError::Encryption("seal failed".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(hex::encode(blob))
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Decryption`] for malformed blobs, a wrong key, or tampered data.
    pub fn decrypt(&self, blob: &str) -> Result<String, AuthError> {
        let mut bytes = hex::decode(blob).map_err(|_| AuthError::Decryption)?;
        if bytes.len() <= NONCE_LEN {
            return Err(AuthError::Decryption);
        }

        let mut sealed = bytes.split_off(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(&bytes).map_err(|_| AuthError::Decryption)?;

        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut sealed)
            .map_err(|_| AuthError::Decryption)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| AuthError::Decryption)
    }
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}
