//! Text encoding for binary values embedded in note records

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::errors::EncryptionResult;

/// Encode bytes as padded standard base64
pub fn to_text(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode padded standard base64 back into bytes
pub fn from_text(text: &str) -> EncryptionResult<Vec<u8>> {
    Ok(BASE64.decode(text)?)
}
