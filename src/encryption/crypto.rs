//! Cryptographic primitives: PBKDF2 key derivation and AES-256-GCM

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use super::errors::{EncryptionError, EncryptionResult};
use super::models::{EncryptionKey, KdfParams, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// Generate a random salt for key derivation
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Generate a random nonce for encryption
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Derive an encryption key from a password using PBKDF2-HMAC-SHA256
pub fn derive_key(password: &str, salt: &[u8], params: &KdfParams) -> EncryptionResult<EncryptionKey> {
    if salt.len() != SALT_SIZE {
        return Err(EncryptionError::KeyDerivationFailed(format!(
            "Invalid salt size: expected {}, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }
    if params.iterations == 0 {
        return Err(EncryptionError::KeyDerivationFailed(
            "Iteration count must be positive".to_string(),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key);

    Ok(EncryptionKey::new(key))
}

/// Encrypt data using AES-256-GCM; the 16-byte tag is appended
pub fn seal(key: &EncryptionKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> EncryptionResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))
}

/// Decrypt and authenticate data using AES-256-GCM
pub fn open(key: &EncryptionKey, nonce: &[u8], ciphertext: &[u8]) -> EncryptionResult<Vec<u8>> {
    if nonce.len() != NONCE_SIZE {
        return Err(EncryptionError::InvalidFormat(format!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| EncryptionError::KeyDerivationFailed(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EncryptionError::InvalidPasswordOrCorruptData)
}
