//! Ethereum account addresses.

use std::fmt;
use std::str::FromStr;

use k256::PublicKey;
use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::constants::ADDRESS_LENGTH;
use crate::error::ValidatorError;
use crate::hashing::keccak256;

/// A 20-byte Ethereum account address.
///
/// Parsing is case-insensitive and accepts an optional `0x` prefix.
/// Display always renders lowercase hex with a `0x` prefix.
///
/// # Example
///
/// ```
/// use ethauth::Address;
///
/// let addr: Address = "0xF0109fC8DF283027b6285cc889F5aA624EaC1F55".parse().unwrap();
/// assert_eq!(addr.to_string(), "0xf0109fc8df283027b6285cc889f5aa624eac1f55");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Parses a hex address, with or without the `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::InvalidAddress` if the input is not exactly
    /// 40 hex digits after the optional prefix.
    pub fn parse(input: &str) -> Result<Self, ValidatorError> {
        let invalid = || ValidatorError::InvalidAddress {
            address: input.to_string(),
        };
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(invalid());
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Derives the account address of a secp256k1 public key.
    ///
    /// The address is the last 20 bytes of the Keccak-256 hash of the
    /// uncompressed public key without its `0x04` tag byte.
    #[must_use]
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let public = PublicKey::from(key);
        let point = public.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
