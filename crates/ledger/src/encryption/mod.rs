//! AES-256-GCM encryption for the chain gateway signing key
//!
//! Supports machine-bound key derivation via Argon2id + machine fingerprint,
//! so a copied ledger file does not leak a usable signing key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use rand::RngCore;
use rewards_core::{Error, Result};

/// Encrypted secret with IV for decryption
#[derive(Debug, Clone)]
pub struct EncryptedSecret {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; 12],
}

/// Handles AES-256-GCM encryption/decryption of stored secrets
pub struct SecretEncryptor {
    cipher: Aes256Gcm,
}

impl SecretEncryptor {
    /// Create a new encryptor from a 32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::EncryptionError(format!(
                "Key must be 32 bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Create encryptor from a passphrase (derives 32-byte key via Argon2id)
    pub fn from_password(password: &str) -> Result<Self> {
        let key = derive_key_from_password(password, b"rewards-ledger-salt-v1")?;
        Self::new(&key)
    }

    /// Encrypt a plaintext secret with a fresh random IV
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret> {
        let mut iv = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        Ok(EncryptedSecret { ciphertext, iv })
    }

    /// Decrypt a stored secret
    pub fn decrypt(&self, encrypted: &EncryptedSecret) -> Result<String> {
        let nonce = Nonce::from_slice(&encrypted.iv);

        let plaintext = self
            .cipher
            .decrypt(nonce, encrypted.ciphertext.as_ref())
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| Error::EncryptionError(e.to_string()))
    }
}

// ─── Machine-bound key derivation ────────────────────────────────────

/// Derive a 32-byte AES key from a password/passphrase using Argon2id
fn derive_key_from_password(password: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| Error::EncryptionError(format!("Argon2 key derivation failed: {}", e)))?;
    Ok(key)
}

/// Get a machine-unique fingerprint string.
///
/// Combines the machine-uid crate with the hostname environment variable
/// as fallback entropy.
fn get_machine_fingerprint() -> String {
    let machine_id =
        machine_uid::get().unwrap_or_else(|_| "fallback-no-machine-id".to_string());

    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string());

    format!("rewards-{}-{}", machine_id, hostname)
}

/// Derive a 32-byte AES encryption key that is bound to this machine.
///
/// The key is stable across calls on the same machine and different on
/// another machine.
pub fn derive_machine_key() -> Result<[u8; 32]> {
    let fingerprint = get_machine_fingerprint();
    let salt = b"rewards-ledger-v1-machine-salt";
    derive_key_from_password(&fingerprint, salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encryptor = SecretEncryptor::from_password("test_password_123").unwrap();
        let original = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

        let encrypted = encryptor.encrypt(original).unwrap();
        let decrypted = encryptor.decrypt(&encrypted).unwrap();

        assert_eq!(original, decrypted);
    }

    #[test]
    fn test_unique_iv_per_encryption() {
        let encryptor = SecretEncryptor::from_password("test_password").unwrap();
        let secret = "signing_key_material";

        let encrypted1 = encryptor.encrypt(secret).unwrap();
        let encrypted2 = encryptor.encrypt(secret).unwrap();

        // IVs should be different
        assert_ne!(encrypted1.iv, encrypted2.iv);
        // Ciphertexts should also differ due to different IVs
        assert_ne!(encrypted1.ciphertext, encrypted2.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encryptor1 = SecretEncryptor::from_password("password1").unwrap();
        let encryptor2 = SecretEncryptor::from_password("password2").unwrap();

        let encrypted = encryptor1.encrypt("secret_key").unwrap();
        let result = encryptor2.decrypt(&encrypted);

        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_key_length() {
        let short_key = [0u8; 16];
        let result = SecretEncryptor::new(&short_key);
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_machine_key() {
        let key1 = derive_machine_key().unwrap();
        let key2 = derive_machine_key().unwrap();
        // Same machine should produce same key
        assert_eq!(key1, key2);
        assert!(key1.iter().any(|&b| b != 0));
    }
}
