//! Encryption error types

use thiserror::Error;

/// Message shown to users for every failure that could be a wrong password.
pub const INVALID_PASSWORD_MESSAGE: &str = "Invalid password or corrupted data";

/// Message shown to users when the platform cannot run the cipher suite.
pub const UNSUPPORTED_MESSAGE: &str = "Encryption is not supported";

/// Errors that can occur during encryption operations
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The GCM tag did not verify. Wrong password and tampered ciphertext
    /// are indistinguishable here.
    #[error("Invalid password or corrupted data")]
    InvalidPasswordOrCorruptData,

    #[error("Base64 decode error: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid encrypted data format: {0}")]
    InvalidFormat(String),

    #[error("Note is locked. Please unlock with password first.")]
    NoteLocked,

    #[error("Encryption is not supported on this platform")]
    Unsupported,
}

impl EncryptionError {
    /// Whether the user can recover by re-entering the password.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPasswordOrCorruptData
                | Self::Encoding(_)
                | Self::InvalidFormat(_)
                | Self::NoteLocked
        )
    }

    /// Text safe to show to the user.
    ///
    /// Encoding and format problems read exactly like a failed
    /// authentication so that a stored payload cannot be probed.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPasswordOrCorruptData | Self::Encoding(_) | Self::InvalidFormat(_) => {
                INVALID_PASSWORD_MESSAGE.to_string()
            }
            Self::KeyDerivationFailed(_) | Self::Unsupported => UNSUPPORTED_MESSAGE.to_string(),
            Self::EncryptionFailed(_) => "Failed to encrypt content".to_string(),
            Self::NoteLocked => self.to_string(),
        }
    }
}

impl From<EncryptionError> for String {
    fn from(err: EncryptionError) -> Self {
        err.to_string()
    }
}

/// Result type alias for encryption operations
pub type EncryptionResult<T> = Result<T, EncryptionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    #[test]
    fn test_auth_and_encoding_share_user_message() {
        let decode_err = BASE64.decode("not base64!").unwrap_err();
        let encoding = EncryptionError::from(decode_err);
        let auth = EncryptionError::InvalidPasswordOrCorruptData;

        assert_eq!(encoding.user_message(), auth.user_message());
        assert_ne!(encoding.to_string(), auth.to_string());
        assert!(encoding.is_recoverable());
        assert!(auth.is_recoverable());
    }

    #[test]
    fn test_platform_failures_are_fatal() {
        let err = EncryptionError::KeyDerivationFailed("no backend".into());
        assert!(!err.is_recoverable());
        assert_eq!(err.user_message(), UNSUPPORTED_MESSAGE);
        assert!(!EncryptionError::Unsupported.is_recoverable());
    }
}
