//! Encoding, decoding and verification of ETHAuth proofs.
//!
//! An ETHAuth proof is a signed statement, made by an Ethereum account,
//! that it authorized a set of claims: an application name, a validity
//! window, and optional nonce, type and origin. Proofs travel as a single
//! dot-separated string:
//!
//! ```text
//! eth.<address>.<base64url(claims-json)>.<signature>[.<extra>]
//! ```
//!
//! The signature covers the EIP-712 digest of the claims, wrapped as an
//! EIP-191 personal message. A proof is accepted when its claims are inside
//! their validity window and at least one configured [`Validator`] accepts
//! the signature.
//!
//! # Quick Start
//!
//! ```rust
//! use ethauth::{Claims, EthAuth, Proof, Validator};
//! use std::time::Duration;
//!
//! let ethauth = EthAuth::new(vec![Validator::Eoa]).unwrap();
//!
//! let mut proof = Proof::new();
//! proof.address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".to_string();
//! proof.claims = Claims::builder()
//!     .app("ExampleApp")
//!     .ttl(Duration::from_secs(3600))
//!     .build()
//!     .unwrap();
//!
//! // The digest the account must sign as a personal message.
//! let digest = ethauth.message_digest(&proof).unwrap();
//! assert_eq!(digest.len(), 32);
//!
//! // Without a signature no validator accepts the proof.
//! proof.signature = "0x".to_string();
//! assert!(ethauth.encode_proof(&proof).is_err());
//! ```
//!
//! # Validators
//!
//! | Validator | Accepts | Needs |
//! |-----------|---------|-------|
//! | [`Validator::Eoa`] | signature recovers to the claimed address | nothing |
//! | [`Validator::ContractAccount`] | deployed contract answers EIP-1271 magic value | a [`ChainReader`] |
//! | [`Validator::Custom`] | whatever the supplied check decides | caller-defined |
//!
//! # Validity Window
//!
//! | Rule | Bound |
//! |------|-------|
//! | Clock drift | 300 s |
//! | Maximum lifetime | 365 days |
//! | `iat` | not after `now + drift` |
//! | `exp` | between `now - drift` and `now + drift + lifetime` |

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod address;
mod chain;
mod claims;
mod config;
mod constants;
mod encoding;
mod error;
mod ethauth;
mod hashing;
pub mod prelude;
mod proof;
#[cfg(kani)]
mod proofs;
mod typed_data;
mod validator;

pub use address::Address;
pub use chain::ChainReader;
pub use claims::{Claims, ClaimsBuilder, Presence};
pub use config::EthAuthConfig;
pub use constants::{
    ADDRESS_HEX_LENGTH, ADDRESS_LENGTH, CLOCK_DRIFT_SECS, EIP1271_MAGIC_VALUE,
    ETHAUTH_DOMAIN_NAME, ETHAUTH_PREFIX, ETHAUTH_VERSION, IS_VALID_SIGNATURE_SELECTOR,
    MAX_LIFETIME_SECS, PERSONAL_MESSAGE_PREFIX, SEGMENT_SEPARATOR, SIGNATURE_LENGTH,
};
pub use encoding::{base64url_decode, base64url_encode};
pub use error::{
    ChainError, ClaimsError, ErrorKind, EthAuthError, ValidatorError, ValidatorFailure,
};
pub use ethauth::{EthAuth, EthAuthBuilder};
pub use hashing::{keccak256, personal_message_hash};
pub use proof::{DecodeError, Proof};
pub use typed_data::{
    CLAIMS_TYPE_NAME, Canonicalizer, ClaimField, Domain, FieldType, FieldValue, TypedData,
    TypedField,
};
pub use validator::{
    ValidateProof, ValidationContext, Validator, encode_is_valid_signature_call,
    validate_contract_account_proof, validate_eoa_proof, validate_eoa_signature,
};
