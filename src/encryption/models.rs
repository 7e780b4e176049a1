//! Encryption data models

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt size in bytes for key derivation
pub const SALT_SIZE: usize = 16;

/// Nonce size in bytes for AES-256-GCM
pub const NONCE_SIZE: usize = 12;

/// Derived key size in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// GCM authentication tag size, appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count used for all new payloads
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Encrypted note content as it is persisted inside a note record.
///
/// All three fields are base64 text. Payloads are never mutated; every
/// encryption produces a new value with a fresh salt and nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// Ciphertext with the GCM tag appended
    pub encrypted_content: String,
    /// 16-byte key derivation salt
    pub salt: String,
    /// 12-byte nonce
    pub iv: String,
}

impl EncryptedPayload {
    pub fn new(encrypted_content: String, salt: String, iv: String) -> Self {
        Self {
            encrypted_content,
            salt,
            iv,
        }
    }
}

/// Encryption key with secure memory handling
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    /// The 256-bit key
    key: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Create a new encryption key from raw bytes
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// PBKDF2 parameters for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of HMAC-SHA256 iterations
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

/// Advisory rating of a password chosen for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Empty,
    Weak,
    Fair,
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Strong => "strong",
        }
    }
}
