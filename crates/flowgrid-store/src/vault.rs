//! Credential vault: AES-256-GCM over a key supplied as 64 hex chars in
//! `ENCRYPTION_KEY`.
//!
//! Ciphertext at rest is `base64(nonce ‖ ct)` with a fresh 12-byte nonce per
//! encryption. Decryption failures are deliberately opaque: callers see the
//! credential as absent, never a brittle error text.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("ENCRYPTION_KEY must be 64 hex characters (32 bytes)")]
    BadKey,

    #[error("ciphertext is not valid")]
    BadCiphertext,
}

/// Symmetric vault keyed from the environment. Cheap to clone; decryption is
/// read-only and safe to parallelise.
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Key from a 64-char hex string (32 bytes).
    pub fn from_hex_key(hex_key: &str) -> Result<Self, VaultError> {
        let bytes = hex::decode(hex_key).map_err(|_| VaultError::BadKey)?;
        if bytes.len() != 32 {
            return Err(VaultError::BadKey);
        }
        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Key from `ENCRYPTION_KEY`.
    pub fn from_env() -> Result<Self, VaultError> {
        let hex_key = std::env::var("ENCRYPTION_KEY").map_err(|_| VaultError::BadKey)?;
        Self::from_hex_key(&hex_key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ct = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::BadCiphertext)?;
        let mut packed = Vec::with_capacity(NONCE_LEN + ct.len());
        packed.extend_from_slice(&nonce);
        packed.extend_from_slice(&ct);
        Ok(BASE64.encode(packed))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, VaultError> {
        let packed = BASE64.decode(stored).map_err(|_| VaultError::BadCiphertext)?;
        if packed.len() <= NONCE_LEN {
            return Err(VaultError::BadCiphertext);
        }
        let (nonce, ct) = packed.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ct)
            .map_err(|_| VaultError::BadCiphertext)?;
        String::from_utf8(plain).map_err(|_| VaultError::BadCiphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";

    #[test]
    fn round_trip() {
        let vault = CredentialVault::from_hex_key(KEY).unwrap();
        let stored = vault.encrypt("sk-test-secret").unwrap();
        assert_ne!(stored, "sk-test-secret");
        assert_eq!(vault.decrypt(&stored).unwrap(), "sk-test-secret");
    }

    #[test]
    fn nonces_differ_per_encryption() {
        let vault = CredentialVault::from_hex_key(KEY).unwrap();
        let a = vault.encrypt("same").unwrap();
        let b = vault.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(vault.decrypt(&a).unwrap(), vault.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails_closed() {
        let vault = CredentialVault::from_hex_key(KEY).unwrap();
        let other = CredentialVault::from_hex_key(
            "00000000000000000000000000000000ffffffffffffffffffffffffffffffff",
        )
        .unwrap();
        let stored = vault.encrypt("secret").unwrap();
        assert!(other.decrypt(&stored).is_err());
    }

    #[test]
    fn rejects_short_keys() {
        assert!(CredentialVault::from_hex_key("abcd").is_err());
        assert!(CredentialVault::from_hex_key("not-hex").is_err());
    }

    #[test]
    fn rejects_garbage_ciphertext() {
        let vault = CredentialVault::from_hex_key(KEY).unwrap();
        assert!(vault.decrypt("!!!").is_err());
        assert!(vault.decrypt("YWJj").is_err());
    }
}
