//! Password-based encryption of note content
//!
//! [`EncryptionService`] composes key derivation, the authenticated cipher
//! and the text encoding into the operations the note lifecycle needs.
//! Every call to `encrypt` re-derives the key under a fresh salt and seals
//! under a fresh nonce.

use rand::RngCore;

use super::crypto::{derive_key, generate_nonce, generate_salt, open, seal};
use super::encoding::{from_text, to_text};
use super::errors::{EncryptionError, EncryptionResult};
use super::models::{EncryptedPayload, KdfParams, PasswordStrength, NONCE_SIZE, SALT_SIZE};

/// Alphabet for generated passwords (70 characters)
pub const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Length used when the caller does not ask for a specific one
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const PROBE_PASSWORD: &str = "notevault-self-test";
const PROBE_CONTENT: &str = "probe";

/// Encrypts and decrypts note content under user passwords.
///
/// Payloads do not record their KDF parameters, so every service derives
/// keys with [`DEFAULT_KDF_ITERATIONS`](super::models::DEFAULT_KDF_ITERATIONS).
#[derive(Debug, Clone, Default)]
pub struct EncryptionService {
    params: KdfParams,
}

impl EncryptionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service with reduced work factor, for self-tests and unit tests.
    /// Its payloads cannot be opened by a default service.
    pub(crate) fn with_params(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypt `content` under `password`, off the async executor
    pub async fn encrypt(&self, content: &str, password: &str) -> EncryptionResult<EncryptedPayload> {
        let service = self.clone();
        let content = zeroize::Zeroizing::new(content.to_string());
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || service.encrypt_blocking(&content, &password))
            .await
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?
    }

    /// Decrypt a payload under `password`, off the async executor
    pub async fn decrypt(&self, payload: &EncryptedPayload, password: &str) -> EncryptionResult<String> {
        let service = self.clone();
        let payload = payload.clone();
        let password = zeroize::Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || service.decrypt_blocking(&payload, &password))
            .await
            .map_err(|e| EncryptionError::KeyDerivationFailed(e.to_string()))?
    }

    /// Whether `password` opens `payload`. The plaintext is discarded.
    pub async fn validate_password(&self, payload: &EncryptedPayload, password: &str) -> bool {
        self.decrypt(payload, password).await.is_ok()
    }

    pub fn encrypt_blocking(&self, content: &str, password: &str) -> EncryptionResult<EncryptedPayload> {
        let salt = generate_salt();
        let nonce = generate_nonce();

        let key = derive_key(password, &salt, &self.params)?;
        let ciphertext = seal(&key, &nonce, content.as_bytes())?;

        Ok(EncryptedPayload::new(
            to_text(&ciphertext),
            to_text(&salt),
            to_text(&nonce),
        ))
    }

    pub fn decrypt_blocking(&self, payload: &EncryptedPayload, password: &str) -> EncryptionResult<String> {
        let result = self.open_payload(payload, password);

        match &result {
            Err(EncryptionError::InvalidPasswordOrCorruptData) => {
                log::warn!("Decryption failed: authentication tag did not verify");
            }
            Err(EncryptionError::Encoding(e)) => {
                log::warn!("Decryption failed: stored payload is not valid base64: {}", e);
            }
            Err(EncryptionError::InvalidFormat(reason)) => {
                log::warn!("Decryption failed: malformed payload: {}", reason);
            }
            Err(e) => log::error!("Decryption failed: {}", e),
            Ok(_) => {}
        }

        result
    }

    fn open_payload(&self, payload: &EncryptedPayload, password: &str) -> EncryptionResult<String> {
        let ciphertext = from_text(&payload.encrypted_content)?;
        let salt = from_text(&payload.salt)?;
        let nonce = from_text(&payload.iv)?;

        if salt.len() != SALT_SIZE {
            return Err(EncryptionError::InvalidFormat(format!(
                "salt is {} bytes, expected {}",
                salt.len(),
                SALT_SIZE
            )));
        }
        if nonce.len() != NONCE_SIZE {
            return Err(EncryptionError::InvalidFormat(format!(
                "iv is {} bytes, expected {}",
                nonce.len(),
                NONCE_SIZE
            )));
        }

        let key = derive_key(password, &salt, &self.params)?;
        let plaintext = open(&key, &nonce, &ciphertext)?;

        String::from_utf8(plaintext)
            .map_err(|_| EncryptionError::InvalidFormat("plaintext is not UTF-8".to_string()))
    }

    /// Seal and open a probe value. False when the cipher suite is unusable.
    pub fn is_crypto_supported(&self) -> bool {
        // A single iteration exercises the same code path at no cost
        let prober = EncryptionService::with_params(KdfParams { iterations: 1 });
        let probe = prober
            .encrypt_blocking(PROBE_CONTENT, PROBE_PASSWORD)
            .and_then(|payload| prober.open_payload(&payload, PROBE_PASSWORD));

        match probe {
            Ok(text) => text == PROBE_CONTENT,
            Err(e) => {
                log::error!("Encryption self-test failed: {}", e);
                false
            }
        }
    }
}

/// Generate a random password drawn from [`PASSWORD_CHARSET`].
///
/// Bytes are mapped modulo the alphabet size. The slight bias toward the
/// first characters is accepted for a convenience generator.
pub fn generate_secure_password(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);

    bytes
        .iter()
        .map(|b| PASSWORD_CHARSET[*b as usize % PASSWORD_CHARSET.len()] as char)
        .collect()
}

/// Rate a password by length and character variety. Advisory only.
pub fn assess_password(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength::Empty;
    }

    let length = password.chars().count();
    let classes = [
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    match (length, classes) {
        (l, c) if l >= 12 && c >= 3 => PasswordStrength::Strong,
        (l, _) if l >= 16 => PasswordStrength::Strong,
        (l, c) if l >= 8 && c >= 2 => PasswordStrength::Fair,
        _ => PasswordStrength::Weak,
    }
}
