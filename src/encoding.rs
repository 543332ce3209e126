//! Text encodings used on the wire: base64url without padding and `0x` hex.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use crate::error::ValidatorError;

/// Encodes bytes as URL-safe base64 with the `=` padding stripped.
///
/// This is the same encoding JWT uses for its segments.
///
/// # Example
///
/// ```
/// assert_eq!(ethauth::base64url_encode(b"{}"), "e30");
/// ```
#[must_use]
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes URL-safe base64 whose padding may have been stripped.
///
/// Padding is restored from the input length modulo 4 before decoding.
///
/// # Errors
///
/// Returns the decoder error if the input is not valid base64url.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = String::with_capacity(input.len() + 3);
    padded.push_str(input);
    let rem = input.len() % 4;
    if rem > 0 {
        for _ in rem..4 {
            padded.push('=');
        }
    }
    URL_SAFE.decode(padded)
}

/// Decodes a `0x`-prefixed hex string.
pub(crate) fn decode_prefixed_hex(
    field: &'static str,
    input: &str,
) -> Result<Vec<u8>, ValidatorError> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| ValidatorError::InvalidHex {
            field,
            reason: "missing 0x prefix".to_string(),
        })?;
    hex::decode(digits).map_err(|e| ValidatorError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

/// Encodes bytes as `0x`-prefixed lowercase hex.
pub(crate) fn encode_prefixed_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
