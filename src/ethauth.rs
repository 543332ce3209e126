//! The `EthAuth` facade: encode, decode and validate proofs.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::address::Address;
use crate::chain::ChainReader;
use crate::config::EthAuthConfig;
use crate::error::{EthAuthError, ValidatorFailure};
use crate::proof::{self, DecodeError, Proof};
use crate::typed_data::Canonicalizer;
use crate::validator::{ValidationContext, Validator};

/// Encodes, decodes and validates proofs against a validator chain.
///
/// A proof is accepted when its claims are valid and at least one validator
/// accepts its signature. Validators run in configured order and the chain
/// stops at the first acceptance; order affects cost, never the outcome.
///
/// The instance holds only immutable configuration and can be shared across
/// threads.
///
/// # Example
///
/// ```
/// use ethauth::{EthAuth, Validator};
///
/// let ethauth = EthAuth::new(vec![Validator::Eoa]).unwrap();
///
/// let result = ethauth.decode_proof("eth.0x.e30");
/// assert!(result.is_err());
/// ```
pub struct EthAuth {
    validators: Vec<Validator>,
    chain_reader: Option<Arc<dyn ChainReader>>,
    chain_id: Option<u64>,
    prefix: String,
    canonicalizer: Canonicalizer,
}

impl EthAuth {
    /// Creates an instance with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::EmptyValidators` if `validators` is empty.
    pub fn new(validators: Vec<Validator>) -> Result<Self, EthAuthError> {
        Self::builder().validators(validators).build()
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> EthAuthBuilder {
        EthAuthBuilder::new()
    }

    /// Replaces the validator chain.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::EmptyValidators` if `validators` is empty; the
    /// existing chain is kept.
    pub fn set_validators(&mut self, validators: Vec<Validator>) -> Result<(), EthAuthError> {
        if validators.is_empty() {
            return Err(EthAuthError::EmptyValidators);
        }
        self.validators = validators;
        Ok(())
    }

    /// Returns the validator chain.
    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Returns the configured chain identifier.
    #[must_use]
    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Returns true if a chain reader is configured.
    #[must_use]
    pub fn has_chain_reader(&self) -> bool {
        self.chain_reader.is_some()
    }

    /// Returns the scheme prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the canonicalizer used for claim digests.
    #[must_use]
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Computes the digest a signer must sign for `proof`.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::InvalidClaims` if the claims are not currently valid.
    pub fn message_digest(&self, proof: &Proof) -> Result<[u8; 32], EthAuthError> {
        Ok(self.canonicalizer.digest(&proof.claims)?)
    }

    /// Validates `proof` and encodes it as a proof string.
    ///
    /// # Errors
    ///
    /// Returns a `Malformed` error if the address, signature or extra data is
    /// badly formatted, and otherwise any error from [`EthAuth::validate_proof`].
    pub fn encode_proof(&self, proof: &Proof) -> Result<String, EthAuthError> {
        proof::check_encodable(proof)?;
        self.validate_proof(proof)?;
        proof::serialize(proof, &self.prefix, self.canonicalizer.presence())
    }

    /// Decodes and validates a proof string.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError`. It carries the parsed proof whenever the
    /// string itself was well formed.
    #[instrument(skip_all)]
    pub fn decode_proof(&self, input: &str) -> Result<Proof, DecodeError> {
        let proof = proof::parse(input, &self.prefix).map_err(|e| {
            debug!(error = %e, "rejecting malformed proof string");
            DecodeError::new(e, None)
        })?;

        match self.validate_proof(&proof) {
            Ok(_) => Ok(proof),
            Err(e) => Err(DecodeError::new(e, Some(proof))),
        }
    }

    /// Checks the claims and the signature of `proof`.
    ///
    /// Returns the signer address resolved by the accepting validator.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::InvalidClaims` or `EthAuthError::SignatureRejected`.
    #[instrument(skip_all, fields(address = %proof.address))]
    pub fn validate_proof(&self, proof: &Proof) -> Result<Address, EthAuthError> {
        self.validate_proof_claims(proof)?;
        self.validate_proof_signature(proof)
    }

    /// Checks the claims of `proof` against the current clock.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::InvalidClaims` naming the violated rule.
    pub fn validate_proof_claims(&self, proof: &Proof) -> Result<(), EthAuthError> {
        Ok(proof.claims.valid()?)
    }

    /// Runs the validator chain over `proof`.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::SignatureRejected` with every validator's reason
    /// if none accepts.
    pub fn validate_proof_signature(&self, proof: &Proof) -> Result<Address, EthAuthError> {
        let ctx = ValidationContext {
            chain_reader: self.chain_reader.as_deref(),
            chain_id: self.chain_id,
            canonicalizer: &self.canonicalizer,
        };

        let mut failures = Vec::new();
        for validator in &self.validators {
            match validator.validate(&ctx, proof) {
                Ok(address) => {
                    debug!(validator = validator.name(), %address, "proof accepted");
                    return Ok(address);
                }
                Err(error) => {
                    debug!(validator = validator.name(), %error, "validator declined proof");
                    failures.push(ValidatorFailure {
                        validator: validator.name().to_string(),
                        error,
                    });
                }
            }
        }
        Err(EthAuthError::SignatureRejected { failures })
    }
}

impl fmt::Debug for EthAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthAuth")
            .field("validators", &self.validators)
            .field("chain_reader", &self.chain_reader.is_some())
            .field("chain_id", &self.chain_id)
            .field("prefix", &self.prefix)
            .field("canonicalizer", &self.canonicalizer)
            .finish()
    }
}

/// Builder for [`EthAuth`].
///
/// # Example
///
/// ```
/// use ethauth::{EthAuth, EthAuthConfig, Validator};
///
/// let ethauth = EthAuth::builder()
///     .config(EthAuthConfig::new().with_chain_id(1))
///     .validators(vec![Validator::Eoa])
///     .build()
///     .unwrap();
///
/// assert_eq!(ethauth.chain_id(), Some(1));
/// assert_eq!(ethauth.validators().len(), 1);
/// ```
#[derive(Default)]
pub struct EthAuthBuilder {
    config: EthAuthConfig,
    validators: Vec<Validator>,
    chain_reader: Option<Arc<dyn ChainReader>>,
}

impl EthAuthBuilder {
    /// Creates a builder with default configuration and no validators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: EthAuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the validator chain.
    #[must_use]
    pub fn validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators = validators;
        self
    }

    /// Appends a validator to the chain.
    #[must_use]
    pub fn add_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Sets the chain reader.
    #[must_use]
    pub fn chain_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.chain_reader = Some(reader);
        self
    }

    /// Builds the instance.
    ///
    /// # Errors
    ///
    /// Returns `EthAuthError::EmptyValidators` if no validator was configured.
    pub fn build(self) -> Result<EthAuth, EthAuthError> {
        if self.validators.is_empty() {
            return Err(EthAuthError::EmptyValidators);
        }
        if self.chain_reader.is_none() {
            for validator in self.validators.iter().filter(|v| v.requires_chain_reader()) {
                warn!(
                    validator = validator.name(),
                    "validator requires a chain reader but none is configured; it will reject every proof"
                );
            }
        }

        Ok(EthAuth {
            canonicalizer: self.config.canonicalizer(),
            prefix: self.config.prefix,
            chain_id: self.config.chain_id,
            chain_reader: self.chain_reader,
            validators: self.validators,
        })
    }
}

impl fmt::Debug for EthAuthBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthAuthBuilder")
            .field("config", &self.config)
            .field("validators", &self.validators)
            .field("chain_reader", &self.chain_reader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::claims::Claims;
    use crate::error::{ErrorKind, ValidatorError};

    const ADDRESS: &str = "0xf0109fc8df283027b6285cc889f5aa624eac1f55";

    fn accept() -> Validator {
        Validator::from_fn("always-accept", |_, proof| proof.account())
    }

    fn reject() -> Validator {
        Validator::from_fn("always-reject", |_, _| {
            Err(ValidatorError::Rejected {
                reason: "no".into(),
            })
        })
    }

    fn proof() -> Proof {
        let mut proof = Proof::new();
        proof.address = ADDRESS.to_string();
        proof.signature = "0x00".to_string();
        proof.claims = Claims::builder()
            .app("EthAuthTest")
            .ttl(std::time::Duration::from_secs(300))
            .build()
            .unwrap();
        proof
    }

    #[test]
    fn empty_validator_list_is_a_configuration_error() {
        let err = EthAuth::new(vec![]).unwrap_err();
        assert_eq!(err, EthAuthError::EmptyValidators);
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn set_validators_keeps_chain_on_empty_input() {
        let mut ethauth = EthAuth::new(vec![accept()]).unwrap();
        assert!(ethauth.set_validators(vec![]).is_err());
        assert_eq!(ethauth.validators().len(), 1);

        ethauth.set_validators(vec![reject(), accept()]).unwrap();
        assert_eq!(ethauth.validators().len(), 2);
    }

    #[test]
    fn chain_is_a_logical_or() {
        let p = proof();
        assert!(
            EthAuth::new(vec![reject(), accept()])
                .unwrap()
                .validate_proof(&p)
                .is_ok()
        );
        assert!(
            EthAuth::new(vec![accept(), reject()])
                .unwrap()
                .validate_proof(&p)
                .is_ok()
        );

        let err = EthAuth::new(vec![reject(), reject()])
            .unwrap()
            .validate_proof(&p)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureRejected);
        let EthAuthError::SignatureRejected { failures } = err else {
            panic!("expected SignatureRejected");
        };
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn chain_short_circuits_on_first_acceptance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = Validator::from_fn("counting", move |_, proof| {
            counter.fetch_add(1, Ordering::SeqCst);
            proof.account()
        });

        let ethauth = EthAuth::new(vec![accept(), counting]).unwrap();
        ethauth.validate_proof(&proof()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_claims_skip_validators() {
        let mut p = proof();
        p.claims.expires_at = None;
        let err = EthAuth::new(vec![accept()])
            .unwrap()
            .validate_proof(&p)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidClaims);
    }

    #[test]
    fn missing_reader_is_reported_as_infrastructure() {
        let ethauth = EthAuth::new(vec![Validator::ContractAccount]).unwrap();
        let err = ethauth.validate_proof(&proof()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn encode_rejects_malformed_fields_before_validation() {
        let ethauth = EthAuth::new(vec![accept()]).unwrap();

        let mut p = proof();
        p.address = "f0109fc8df283027b6285cc889f5aa624eac1f5500".into();
        assert!(matches!(
            ethauth.encode_proof(&p),
            Err(EthAuthError::InvalidAddress { .. })
        ));

        let mut p = proof();
        p.signature = "00".into();
        assert_eq!(
            ethauth.encode_proof(&p),
            Err(EthAuthError::InvalidSignatureEncoding)
        );
    }

    #[test]
    fn encode_propagates_validation_error() {
        let ethauth = EthAuth::new(vec![reject()]).unwrap();
        let err = ethauth.encode_proof(&proof()).unwrap_err();
        assert!(matches!(err, EthAuthError::SignatureRejected { .. }));
    }

    #[test]
    fn encode_then_decode_with_custom_validator() {
        let ethauth = EthAuth::new(vec![accept()]).unwrap();
        let mut p = proof();
        p.address = ADDRESS.to_uppercase().replacen("0X", "0x", 1);

        let encoded = ethauth.encode_proof(&p).unwrap();
        assert!(encoded.starts_with("eth.0xf0109fc8"));

        let decoded = ethauth.decode_proof(&encoded).unwrap();
        assert_eq!(decoded.address, ADDRESS);
        assert_eq!(decoded.claims, p.claims);
        assert_eq!(decoded.signature, p.signature);
    }

    #[test]
    fn decode_returns_proof_on_rejection() {
        let encoded = EthAuth::new(vec![accept()])
            .unwrap()
            .encode_proof(&proof())
            .unwrap();

        let err = EthAuth::new(vec![reject()])
            .unwrap()
            .decode_proof(&encoded)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SignatureRejected);
        assert_eq!(err.proof().map(|p| p.address.as_str()), Some(ADDRESS));
    }

    #[test]
    fn decode_malformed_has_no_proof() {
        let ethauth = EthAuth::new(vec![accept()]).unwrap();
        let err = ethauth.decode_proof("eth.a.b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.proof().is_none());
    }

    #[test]
    fn custom_prefix_round_trip() {
        let ethauth = EthAuth::builder()
            .config(EthAuthConfig::new().with_prefix("test"))
            .add_validator(accept())
            .build()
            .unwrap();
        let encoded = ethauth.encode_proof(&proof()).unwrap();
        assert!(encoded.starts_with("test."));
        assert!(ethauth.decode_proof(&encoded).is_ok());

        let default = EthAuth::new(vec![accept()]).unwrap();
        assert!(matches!(
            default.decode_proof(&encoded).unwrap_err().error(),
            EthAuthError::UnrecognizedPrefix { .. }
        ));
    }

    #[test]
    fn context_exposes_chain_id() {
        let ethauth = EthAuth::builder()
            .config(EthAuthConfig::new().with_chain_id(10))
            .add_validator(Validator::from_fn("chain-10", |ctx, proof| {
                if ctx.chain_id == Some(10) {
                    proof.account()
                } else {
                    Err(ValidatorError::Rejected {
                        reason: "wrong chain".into(),
                    })
                }
            }))
            .build()
            .unwrap();
        assert!(ethauth.validate_proof(&proof()).is_ok());
    }

    #[test]
    fn ethauth_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EthAuth>();
    }
}
