//! Client-side password encryption for note content
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation
//! - AES-256-GCM authenticated encryption
//! - Base64 encoding of salt, nonce and ciphertext for note records
//! - A volatile cache of decrypted content for unlocked notes

pub mod crypto;
pub mod encoding;
pub mod errors;
pub mod manager;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use crypto::{derive_key, generate_nonce, generate_salt, open, seal};
pub use encoding::{from_text, to_text};
pub use errors::{EncryptionError, EncryptionResult, INVALID_PASSWORD_MESSAGE, UNSUPPORTED_MESSAGE};
pub use manager::{UnlockCache, UnlockStats, DEFAULT_AUTO_LOCK_TIMEOUT};
pub use models::{
    EncryptedPayload, EncryptionKey, KdfParams, PasswordStrength, DEFAULT_KDF_ITERATIONS, KEY_SIZE,
    NONCE_SIZE, SALT_SIZE, TAG_SIZE,
};
pub use service::{
    assess_password, generate_secure_password, EncryptionService, DEFAULT_PASSWORD_LENGTH,
    PASSWORD_CHARSET,
};
