//! Keccak-256 hashing primitives.

use sha3::{Digest, Keccak256};

use crate::constants::PERSONAL_MESSAGE_PREFIX;

/// Computes the Keccak-256 hash of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Computes the EIP-191 personal-message hash of `message`.
///
/// The hashed bytes are `"\x19Ethereum Signed Message:\n"`, the decimal
/// length of `message`, then `message` itself.
#[must_use]
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn is_valid_signature_selector() {
        let hash = keccak256(b"isValidSignature(bytes32,bytes)");
        assert_eq!(hash[..4], crate::constants::IS_VALID_SIGNATURE_SELECTOR);
        assert_eq!(
            crate::constants::IS_VALID_SIGNATURE_SELECTOR,
            crate::constants::EIP1271_MAGIC_VALUE
        );
    }

    #[test]
    fn personal_message_includes_length_prefix() {
        let expected = keccak256(b"\x19Ethereum Signed Message:\n5hello");
        assert_eq!(personal_message_hash(b"hello"), expected);
    }
}
