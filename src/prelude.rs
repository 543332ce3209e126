//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use ethauth::prelude::*;
//!
//! let ethauth = EthAuth::new(Validator::defaults()).unwrap();
//! assert_eq!(ethauth.prefix(), ETHAUTH_PREFIX);
//! ```
//!
//! Typed-data internals (`FieldValue`, `ClaimField`, `TypedField`) are left
//! out; import them from the crate root when needed.

pub use crate::{
    // Core types
    Address, Claims, ClaimsBuilder, DecodeError, Presence, Proof,
    // Verification
    ChainReader, EthAuth, EthAuthBuilder, EthAuthConfig, ValidateProof, ValidationContext,
    Validator,
    // Errors
    ChainError, ClaimsError, ErrorKind, EthAuthError, ValidatorError, ValidatorFailure,
    // Constants
    CLOCK_DRIFT_SECS, ETHAUTH_PREFIX, ETHAUTH_VERSION, MAX_LIFETIME_SECS,
};
