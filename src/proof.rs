//! Proof value type and its string wire format.
//!
//! ```text
//! <prefix>.<address>.<base64url(claims-json)>.<signature-hex>[.<extra-hex>]
//! ```
//!
//! The claims segment is URL-safe base64 with padding stripped. The address
//! is lowercased when encoding and kept verbatim when decoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::claims::{Claims, Presence};
use crate::constants::{ADDRESS_HEX_LENGTH, ETHAUTH_PREFIX, ETHAUTH_VERSION, SEGMENT_SEPARATOR};
use crate::encoding::{base64url_decode, base64url_encode};
use crate::error::{ClaimsError, ErrorKind, EthAuthError, ValidatorError};
use crate::typed_data::TypedData;

/// A signed statement that an account authorized a set of claims.
///
/// # Example
///
/// ```
/// use ethauth::Proof;
///
/// let proof = Proof::new();
/// assert_eq!(proof.prefix, "eth");
/// assert_eq!(proof.claims.version.as_deref(), Some("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Scheme tag
    pub prefix: String,
    /// Signing account, `0x`-prefixed hex
    pub address: String,
    /// Signed claims
    pub claims: Claims,
    /// Signature over the claims digest, `0x`-prefixed hex
    pub signature: String,
    /// Auxiliary validator data, `0x`-prefixed hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl Proof {
    /// Creates an empty proof with the scheme prefix and current version set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: ETHAUTH_PREFIX.to_string(),
            address: String::new(),
            claims: Claims {
                version: Some(ETHAUTH_VERSION.to_string()),
                ..Claims::default()
            },
            signature: String::new(),
            extra: None,
        }
    }

    /// Parses the claimed address.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::InvalidAddress` if the address is not valid hex.
    pub fn account(&self) -> Result<Address, ValidatorError> {
        Address::parse(&self.address)
    }

    /// Returns the extra data if it is set and non-empty.
    #[must_use]
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref().filter(|e| !e.is_empty())
    }

    /// Computes the claims digest under the default domain.
    ///
    /// # Errors
    ///
    /// Returns a `ClaimsError` if the claims are not currently valid.
    pub fn message_digest(&self) -> Result<[u8; 32], ClaimsError> {
        self.claims.message_digest()
    }

    /// Builds the claims typed data under the default domain.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Empty` if no claim is present.
    pub fn message_typed_data(&self) -> Result<TypedData, ClaimsError> {
        self.claims.typed_data()
    }
}

impl Default for Proof {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks the syntactic constraints on a proof before encoding.
pub(crate) fn check_encodable(proof: &Proof) -> Result<(), EthAuthError> {
    if proof.address.len() != ADDRESS_HEX_LENGTH || !proof.address.starts_with("0x") {
        return Err(EthAuthError::InvalidAddress {
            address: proof.address.clone(),
        });
    }
    if !proof.signature.starts_with("0x") {
        return Err(EthAuthError::InvalidSignatureEncoding);
    }
    if let Some(extra) = proof.extra() {
        if !extra.starts_with("0x") {
            return Err(EthAuthError::InvalidExtraEncoding);
        }
    }
    Ok(())
}

/// Joins the proof segments into the wire string.
pub(crate) fn serialize(
    proof: &Proof,
    prefix: &str,
    presence: Presence,
) -> Result<String, EthAuthError> {
    let claims_json = proof
        .claims
        .to_json(presence)
        .map_err(|e| EthAuthError::Serialization {
            reason: e.to_string(),
        })?;

    let mut segments = vec![
        prefix.to_string(),
        proof.address.to_lowercase(),
        base64url_encode(&claims_json),
        proof.signature.clone(),
    ];
    if let Some(extra) = proof.extra() {
        segments.push(extra.to_string());
    }
    Ok(segments.join(SEGMENT_SEPARATOR))
}

/// Splits a proof string and decodes its claims, without validating.
pub(crate) fn parse(input: &str, expected_prefix: &str) -> Result<Proof, EthAuthError> {
    let parts: Vec<&str> = input.split(SEGMENT_SEPARATOR).collect();
    if parts.len() < 4 || parts.len() > 5 {
        return Err(EthAuthError::MalformedProof {
            segments: parts.len(),
        });
    }

    if parts[0] != expected_prefix {
        return Err(EthAuthError::UnrecognizedPrefix {
            found: parts[0].to_string(),
        });
    }

    let claims_json = base64url_decode(parts[2]).map_err(|e| EthAuthError::InvalidBase64 {
        reason: e.to_string(),
    })?;
    let claims: Claims =
        serde_json::from_slice(&claims_json).map_err(|e| EthAuthError::InvalidClaimsJson {
            reason: e.to_string(),
        })?;

    Ok(Proof {
        prefix: parts[0].to_string(),
        address: parts[1].to_string(),
        claims,
        signature: parts[3].to_string(),
        extra: parts
            .get(4)
            .filter(|e| !e.is_empty())
            .map(|e| (*e).to_string()),
    })
}

/// A proof string that was not accepted.
///
/// Carries the parsed proof when decoding got far enough to produce one, so
/// callers can inspect what was presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    error: EthAuthError,
    proof: Option<Box<Proof>>,
}

impl DecodeError {
    pub(crate) fn new(error: EthAuthError, proof: Option<Proof>) -> Self {
        Self {
            error,
            proof: proof.map(Box::new),
        }
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn error(&self) -> &EthAuthError {
        &self.error
    }

    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Returns the parsed proof, if parsing succeeded.
    #[must_use]
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_deref()
    }

    /// Splits into the error and the parsed proof.
    #[must_use]
    pub fn into_parts(self) -> (EthAuthError, Option<Proof>) {
        (self.error, self.proof.map(|p| *p))
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
