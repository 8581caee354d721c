use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::CryptoError;

pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode standard padded base64. Malformed input is reported as an
/// authentication failure since it only ever comes from a stored payload.
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(text.trim())
        .map_err(|_| CryptoError::AuthenticationFailure)
}
