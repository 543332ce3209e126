//! Signature validators.
//!
//! A validator decides whether a proof's signature was produced by the
//! claimed account. Two account types are built in:
//!
//! | Validator | Account type | Network |
//! |-----------|--------------|---------|
//! | [`Validator::Eoa`] | key-controlled account, personal-message signature | none |
//! | [`Validator::ContractAccount`] | deployed smart wallet, EIP-1271 callback | two reads |
//!
//! Anything else (undeployed wallets, other chains) plugs in through
//! [`Validator::custom`] or [`Validator::from_fn`].

use std::fmt;
use std::sync::Arc;

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::debug;

use crate::address::Address;
use crate::chain::ChainReader;
use crate::constants::{EIP1271_MAGIC_VALUE, IS_VALID_SIGNATURE_SELECTOR, SIGNATURE_LENGTH};
use crate::encoding::{decode_prefixed_hex, encode_prefixed_hex};
use crate::error::ValidatorError;
use crate::hashing::{keccak256, personal_message_hash};
use crate::proof::Proof;
use crate::typed_data::Canonicalizer;

/// What a validator can see besides the proof.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Chain access, if configured
    pub chain_reader: Option<&'a dyn ChainReader>,
    /// Chain identifier, if configured
    pub chain_id: Option<u64>,
    /// Canonicalizer used to recompute the claims digest
    pub canonicalizer: &'a Canonicalizer,
}

impl ValidationContext<'_> {
    /// Recomputes the digest the signer must have signed.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::Digest` if the claims are not currently valid.
    pub fn message_digest(&self, proof: &Proof) -> Result<[u8; 32], ValidatorError> {
        self.canonicalizer
            .digest(&proof.claims)
            .map_err(ValidatorError::Digest)
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("chain_reader", &self.chain_reader.is_some())
            .field("chain_id", &self.chain_id)
            .field("canonicalizer", &self.canonicalizer)
            .finish()
    }
}

/// A pluggable signature check.
///
/// Returns the resolved signer address on acceptance. Any error is a
/// non-acceptance by this validator only; the chain moves on to the next.
///
/// Closures with the matching signature implement this trait.
pub trait ValidateProof: Send + Sync {
    /// Checks the proof signature.
    ///
    /// # Errors
    ///
    /// Returns a `ValidatorError` describing why the proof was not accepted.
    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        proof: &Proof,
    ) -> Result<Address, ValidatorError>;
}

impl<F> ValidateProof for F
where
    F: Fn(&ValidationContext<'_>, &Proof) -> Result<Address, ValidatorError> + Send + Sync,
{
    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        proof: &Proof,
    ) -> Result<Address, ValidatorError> {
        self(ctx, proof)
    }
}

/// One entry of a validator chain.
#[derive(Clone)]
pub enum Validator {
    /// Externally-owned account: personal-message signature recovery.
    Eoa,
    /// Deployed contract account: EIP-1271 `isValidSignature` callback.
    ContractAccount,
    /// Caller-supplied validator.
    Custom {
        /// Name used in logs and error reports
        name: String,
        /// The check itself
        validator: Arc<dyn ValidateProof>,
    },
}

impl Validator {
    /// Wraps a custom check.
    #[must_use]
    pub fn custom(name: impl Into<String>, validator: impl ValidateProof + 'static) -> Self {
        Self::Custom {
            name: name.into(),
            validator: Arc::new(validator),
        }
    }

    /// Wraps a closure as a custom check.
    ///
    /// # Example
    ///
    /// ```
    /// use ethauth::{Validator, ValidatorError};
    ///
    /// let deny_all = Validator::from_fn("deny-all", |_, _| {
    ///     Err(ValidatorError::Rejected { reason: "closed".into() })
    /// });
    /// assert_eq!(deny_all.name(), "deny-all");
    /// ```
    #[must_use]
    pub fn from_fn<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ValidationContext<'_>, &Proof) -> Result<Address, ValidatorError>
            + Send
            + Sync
            + 'static,
    {
        Self::custom(name, check)
    }

    /// Returns the EOA and contract-account validators, in that order.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::Eoa, Self::ContractAccount]
    }

    /// Returns the validator name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Eoa => "eoa",
            Self::ContractAccount => "contract-account",
            Self::Custom { name, .. } => name,
        }
    }

    /// Returns true if this validator cannot accept anything without a chain reader.
    #[must_use]
    pub fn requires_chain_reader(&self) -> bool {
        matches!(self, Self::ContractAccount)
    }

    /// Runs this validator.
    ///
    /// # Errors
    ///
    /// Returns a `ValidatorError` if the proof is not accepted.
    pub fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        proof: &Proof,
    ) -> Result<Address, ValidatorError> {
        match self {
            Self::Eoa => validate_eoa_proof(ctx, proof),
            Self::ContractAccount => validate_contract_account_proof(ctx, proof),
            Self::Custom { validator, .. } => validator.validate(ctx, proof),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eoa => f.write_str("Eoa"),
            Self::ContractAccount => f.write_str("ContractAccount"),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

/// Checks that the claims digest was signed by the claimed key-controlled account.
///
/// # Errors
///
/// Returns a `ValidatorError` if the digest cannot be computed or the
/// signature does not recover to the claimed address.
pub fn validate_eoa_proof(
    ctx: &ValidationContext<'_>,
    proof: &Proof,
) -> Result<Address, ValidatorError> {
    let digest = ctx.message_digest(proof)?;
    validate_eoa_signature(&proof.address, &digest, &proof.signature)
}

/// Checks a personal-message signature over `message` against `address`.
///
/// The signature is 65 bytes `r || s || v`; a legacy `v` of 27 or 28 is
/// accepted. Address comparison is case-insensitive.
///
/// # Errors
///
/// Returns a `ValidatorError` if the address or signature is malformed,
/// the message is empty, recovery fails, or the recovered signer differs.
pub fn validate_eoa_signature(
    address: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<Address, ValidatorError> {
    let expected = Address::parse(address)?;
    if message.is_empty() {
        return Err(ValidatorError::EmptyInput { field: "message" });
    }
    if signature_hex.is_empty() {
        return Err(ValidatorError::EmptyInput { field: "signature" });
    }
    let signature = decode_prefixed_hex("signature", signature_hex)?;
    if signature.len() != SIGNATURE_LENGTH {
        return Err(ValidatorError::InvalidSignatureLength {
            actual: signature.len(),
        });
    }

    let recovered = recover_signer(&personal_message_hash(message), &signature)?;
    if recovered != expected {
        return Err(ValidatorError::SignerMismatch {
            expected: expected.to_string(),
            recovered: recovered.to_string(),
        });
    }
    Ok(expected)
}

/// Recovers the signing address from a prehashed message and a 65-byte signature.
fn recover_signer(prehash: &[u8; 32], signature: &[u8]) -> Result<Address, ValidatorError> {
    let recovery_error = |reason: String| ValidatorError::Recovery { reason };

    let mut v = signature[64];
    if v > 1 {
        v = v.wrapping_sub(27);
    }
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| recovery_error(format!("invalid recovery id {}", signature[64])))?;
    let sig = Signature::from_slice(&signature[..64]).map_err(|e| recovery_error(e.to_string()))?;

    // High-S signatures are valid on chain; recover with the low-S twin.
    let (sig, recovery_id) = match sig.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (sig, recovery_id),
    };

    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|e| recovery_error(e.to_string()))?;
    Ok(Address::from_public_key(&key))
}

/// Checks the proof through the account contract's EIP-1271 callback.
///
/// The account must have code deployed. The contract is asked
/// `isValidSignature(keccak256(digest), signature)` and must answer with the
/// magic value `0x1626ba7e`.
///
/// # Errors
///
/// Returns `ValidatorError::MissingChainReader` without a reader,
/// `ValidatorError::NotDeployed` for an account without code,
/// `ValidatorError::Chain` if a read fails, and
/// `ValidatorError::InvalidMagicValue` if the contract declines.
pub fn validate_contract_account_proof(
    ctx: &ValidationContext<'_>,
    proof: &Proof,
) -> Result<Address, ValidatorError> {
    let reader = ctx.chain_reader.ok_or(ValidatorError::MissingChainReader)?;
    let digest = ctx.message_digest(proof)?;
    let account = proof.account()?;

    let code = reader.code_at(&account)?;
    if code.is_empty() {
        return Err(ValidatorError::NotDeployed {
            address: account.to_string(),
        });
    }

    let signature = decode_prefixed_hex("signature", &proof.signature)?;
    let calldata = encode_is_valid_signature_call(&keccak256(&digest), &signature);
    let output = reader.call(&account, &calldata)?;
    debug!(
        account = %account,
        returned = output.len(),
        "isValidSignature call completed"
    );

    if output.len() >= 4 && output[..4] == EIP1271_MAGIC_VALUE {
        Ok(account)
    } else {
        Err(ValidatorError::InvalidMagicValue {
            returned: encode_prefixed_hex(&output[..output.len().min(4)]),
        })
    }
}

/// ABI-encodes a call to `isValidSignature(bytes32,bytes)`.
///
/// Layout: selector, `hash`, offset of the bytes argument (`0x40`), its
/// length, then the signature right-padded to a 32-byte boundary.
#[must_use]
pub fn encode_is_valid_signature_call(hash: &[u8; 32], signature: &[u8]) -> Vec<u8> {
    let padded_len = signature.len().div_ceil(32) * 32;
    let mut calldata = Vec::with_capacity(4 + 32 * 3 + padded_len);

    calldata.extend_from_slice(&IS_VALID_SIGNATURE_SELECTOR);
    calldata.extend_from_slice(hash);
    calldata.extend_from_slice(&abi_word(0x40));
    calldata.extend_from_slice(&abi_word(signature.len() as u64));
    calldata.extend_from_slice(signature);
    calldata.resize(4 + 32 * 3 + padded_len, 0);
    calldata
}

fn abi_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
