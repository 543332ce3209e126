//! Error types for proof encoding, decoding and validation.

use std::fmt;

/// Broad category of an [`EthAuthError`].
///
/// Lets callers branch on the failure class without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The proof string or proof fields are syntactically malformed.
    Malformed,
    /// The claims failed a validity rule.
    InvalidClaims,
    /// No validator accepted the signature.
    SignatureRejected,
    /// Every validator failed for infrastructure reasons (network, missing reader).
    Infrastructure,
    /// The `EthAuth` instance was configured incorrectly.
    Configuration,
}

/// Errors returned by the `EthAuth` facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthAuthError {
    /// The validator list was empty.
    EmptyValidators,
    /// Address is not a `0x`-prefixed, 42 character hex string.
    InvalidAddress {
        /// The offending address
        address: String,
    },
    /// Signature is empty or not `0x`-prefixed.
    InvalidSignatureEncoding,
    /// Extra data is present but not `0x`-prefixed.
    InvalidExtraEncoding,
    /// Proof string does not have four or five segments.
    MalformedProof {
        /// Number of segments found
        segments: usize,
    },
    /// First segment is not the expected scheme prefix.
    UnrecognizedPrefix {
        /// The prefix found in the proof string
        found: String,
    },
    /// Claims segment is not valid base64url.
    InvalidBase64 {
        /// Decoder error message
        reason: String,
    },
    /// Claims segment decoded but is not a valid claims JSON object.
    InvalidClaimsJson {
        /// Parser error message
        reason: String,
    },
    /// Claims could not be serialized.
    Serialization {
        /// Serializer error message
        reason: String,
    },
    /// Claims failed a validity rule.
    InvalidClaims(ClaimsError),
    /// No validator in the chain accepted the proof.
    SignatureRejected {
        /// Why each validator declined, in chain order
        failures: Vec<ValidatorFailure>,
    },
}

impl EthAuthError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyValidators => ErrorKind::Configuration,
            Self::InvalidAddress { .. }
            | Self::InvalidSignatureEncoding
            | Self::InvalidExtraEncoding
            | Self::MalformedProof { .. }
            | Self::UnrecognizedPrefix { .. }
            | Self::InvalidBase64 { .. }
            | Self::InvalidClaimsJson { .. }
            | Self::Serialization { .. } => ErrorKind::Malformed,
            Self::InvalidClaims(_) => ErrorKind::InvalidClaims,
            Self::SignatureRejected { failures } => {
                if !failures.is_empty() && failures.iter().all(|f| f.error.is_infrastructure()) {
                    ErrorKind::Infrastructure
                } else {
                    ErrorKind::SignatureRejected
                }
            }
        }
    }
}

impl fmt::Display for EthAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValidators => write!(f, "ethauth: validator list is empty"),
            Self::InvalidAddress { address } => {
                write!(
                    f,
                    "ethauth: invalid address '{address}'; expected 0x-prefixed 20-byte hex"
                )
            }
            Self::InvalidSignatureEncoding => {
                write!(f, "ethauth: signature must be non-empty 0x-prefixed hex")
            }
            Self::InvalidExtraEncoding => {
                write!(f, "ethauth: invalid extra encoding, expecting 0x-prefixed hex")
            }
            Self::MalformedProof { segments } => {
                write!(
                    f,
                    "ethauth: malformed proof string; expected 4 or 5 segments, found {segments}"
                )
            }
            Self::UnrecognizedPrefix { found } => {
                write!(f, "ethauth: not an ethauth proof (prefix '{found}')")
            }
            Self::InvalidBase64 { reason } => {
                write!(f, "ethauth: decoding failed, invalid claims encoding: {reason}")
            }
            Self::InvalidClaimsJson { reason } => {
                write!(f, "ethauth: decoding failed, cannot unmarshal claims: {reason}")
            }
            Self::Serialization { reason } => {
                write!(f, "ethauth: cannot marshal proof claims: {reason}")
            }
            Self::InvalidClaims(e) => write!(f, "ethauth: proof claims are invalid: {e}"),
            Self::SignatureRejected { failures } => {
                write!(f, "ethauth: proof signature is invalid")?;
                for failure in failures {
                    write!(f, "; {failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EthAuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidClaims(e) => Some(e),
            Self::SignatureRejected { failures } => failures
                .first()
                .map(|f| &f.error as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<ClaimsError> for EthAuthError {
    fn from(e: ClaimsError) -> Self {
        Self::InvalidClaims(e)
    }
}

/// A claims validity rule that was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// The `v` claim is missing.
    MissingVersion,
    /// The `app` claim is missing.
    MissingApp,
    /// `iat` lies beyond the allowed clock drift.
    IssuedInFuture {
        /// The `iat` claim
        issued_at: i64,
        /// Verifier clock at validation time
        now: i64,
    },
    /// `exp` has passed, is unset, or the validity window exceeds the maximum lifetime.
    Expired {
        /// The `exp` claim, if set
        expires_at: Option<i64>,
        /// Verifier clock at validation time
        now: i64,
    },
    /// No claim field is present, so there is nothing to sign.
    Empty,
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVersion => write!(f, "claims: ethauth version is empty"),
            Self::MissingApp => write!(f, "claims: app is empty"),
            Self::IssuedInFuture { issued_at, now } => {
                write!(
                    f,
                    "claims: proof is issued from the future (iat {issued_at}, now {now}); check if device clock is synced"
                )
            }
            Self::Expired { expires_at, now } => match expires_at {
                Some(exp) => write!(f, "claims: proof has expired (exp {exp}, now {now})"),
                None => write!(f, "claims: proof has expired (exp unset)"),
            },
            Self::Empty => write!(f, "claims: no claim fields are set"),
        }
    }
}

impl std::error::Error for ClaimsError {}

/// Why a single validator declined a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// Claimed address is not a valid account address.
    InvalidAddress {
        /// The offending address
        address: String,
    },
    /// A hex field could not be decoded.
    InvalidHex {
        /// Name of the field
        field: &'static str,
        /// Decoder error message
        reason: String,
    },
    /// A required input was empty.
    EmptyInput {
        /// Name of the field
        field: &'static str,
    },
    /// Signature is not 65 bytes.
    InvalidSignatureLength {
        /// Decoded length
        actual: usize,
    },
    /// Public key recovery failed.
    Recovery {
        /// Recovery error message
        reason: String,
    },
    /// Recovered signer differs from the claimed address.
    SignerMismatch {
        /// Claimed address
        expected: String,
        /// Address recovered from the signature
        recovered: String,
    },
    /// The claims digest could not be computed.
    Digest(ClaimsError),
    /// The validator needs a chain reader and none is configured.
    MissingChainReader,
    /// No contract code is deployed at the address.
    NotDeployed {
        /// The account address
        address: String,
    },
    /// The chain reader failed.
    Chain(ChainError),
    /// The contract did not return the EIP-1271 magic value.
    InvalidMagicValue {
        /// Hex of the returned data
        returned: String,
    },
    /// A custom validator declined the proof.
    Rejected {
        /// Reason supplied by the validator
        reason: String,
    },
}

impl ValidatorError {
    /// Returns true if this failure came from missing or failing infrastructure
    /// rather than from the signature itself.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::MissingChainReader | Self::Chain(_))
    }
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { address } => {
                write!(f, "address '{address}' is not a valid account address")
            }
            Self::InvalidHex { field, reason } => write!(f, "{field} is invalid hex: {reason}"),
            Self::EmptyInput { field } => write!(f, "{field} must not be empty"),
            Self::InvalidSignatureLength { actual } => {
                write!(f, "signature is {actual} bytes, expected 65")
            }
            Self::Recovery { reason } => write!(f, "signer recovery failed: {reason}"),
            Self::SignerMismatch {
                expected,
                recovered,
            } => {
                write!(
                    f,
                    "invalid signature: recovered signer {recovered} does not match {expected}"
                )
            }
            Self::Digest(e) => write!(f, "unable to compute message digest: {e}"),
            Self::MissingChainReader => write!(f, "no chain reader configured"),
            Self::NotDeployed { address } => {
                write!(f, "no contract code at {address}; wallet is likely not deployed")
            }
            Self::Chain(e) => write!(f, "chain reader failed: {e}"),
            Self::InvalidMagicValue { returned } => {
                write!(f, "isValidSignature returned {returned}, expected 0x1626ba7e")
            }
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

impl std::error::Error for ValidatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Digest(e) => Some(e),
            Self::Chain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChainError> for ValidatorError {
    fn from(e: ChainError) -> Self {
        Self::Chain(e)
    }
}

/// A validator's failure, tagged with the validator that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorFailure {
    /// Name of the validator
    pub validator: String,
    /// Why it declined
    pub error: ValidatorError,
}

impl fmt::Display for ValidatorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.validator, self.error)
    }
}

/// Error reported by a [`ChainReader`](crate::ChainReader) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainError {
    message: String,
}

impl ChainError {
    /// Creates a chain error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ChainError {}
