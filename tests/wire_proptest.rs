//! Property-based tests for claim validity and the proof wire format.
//!
//! Validity is checked against a fixed clock so the generated windows are
//! exact; tamper tests sign one proof per case and mutate its token.

use std::time::Duration;

use proptest::prelude::*;

use ethauth::{
    Address, CLOCK_DRIFT_SECS, Claims, ClaimsError, ErrorKind, EthAuth, MAX_LIFETIME_SECS, Proof,
    Validator, personal_message_hash,
};
use k256::ecdsa::SigningKey;

/// Fixed clock for window properties.
const NOW: i64 = 1_700_000_000;

const BASE64URL_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const HEX_DIGITS: &[u8] = b"0123456789abcdef";

fn claims_at(issued_at: i64, expires_at: i64) -> Claims {
    Claims {
        app: Some("PropTest".into()),
        issued_at: Some(issued_at),
        expires_at: Some(expires_at),
        version: Some("1".into()),
        ..Claims::default()
    }
}

fn signed_token(seed: [u8; 32]) -> Option<(EthAuth, String)> {
    let key = SigningKey::from_slice(&seed).ok()?;
    let ethauth = EthAuth::new(vec![Validator::Eoa]).ok()?;

    let mut proof = Proof::new();
    proof.address = Address::from_public_key(key.verifying_key()).to_string();
    proof.claims = Claims::builder()
        .app("PropTest")
        .ttl(Duration::from_secs(3600))
        .build()
        .ok()?;
    let digest = ethauth.message_digest(&proof).ok()?;
    let (sig, recid) = key
        .sign_prehash_recoverable(&personal_message_hash(&digest))
        .ok()?;
    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(recid.to_byte() + 27);
    proof.signature = format!("0x{}", hex::encode(bytes));

    let token = ethauth.encode_proof(&proof).ok()?;
    Some((ethauth, token))
}

/// Replaces the byte at `index` of `segment` with a different byte from `alphabet`.
fn replace_char(segment: &str, index: usize, alphabet: &[u8], pick: usize) -> String {
    let mut bytes = segment.as_bytes().to_vec();
    let original = bytes[index];
    let candidates: Vec<u8> = alphabet.iter().copied().filter(|c| *c != original).collect();
    bytes[index] = candidates[pick % candidates.len()];
    String::from_utf8(bytes).unwrap()
}

proptest! {
    #[test]
    fn issued_now_within_lifetime_is_valid(k in 1..=MAX_LIFETIME_SECS) {
        prop_assert!(claims_at(NOW, NOW + k).valid_at(NOW).is_ok());
    }

    #[test]
    fn issued_beyond_drift_is_future(ahead in (CLOCK_DRIFT_SECS + 1)..=MAX_LIFETIME_SECS) {
        let result = claims_at(NOW + ahead, NOW + ahead + 60).valid_at(NOW);
        prop_assert!(
            matches!(result, Err(ClaimsError::IssuedInFuture { .. })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn expired_beyond_drift_is_expired(behind in (CLOCK_DRIFT_SECS + 1)..=MAX_LIFETIME_SECS) {
        let result = claims_at(NOW - behind - 60, NOW - behind).valid_at(NOW);
        prop_assert!(
            matches!(result, Err(ClaimsError::Expired { .. })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn validity_never_panics(iat in any::<Option<i64>>(), exp in any::<Option<i64>>(), now in any::<i64>()) {
        let claims = Claims {
            app: Some("PropTest".into()),
            issued_at: iat,
            expires_at: exp,
            version: Some("1".into()),
            ..Claims::default()
        };
        let _ = claims.valid_at(now);
    }

    #[test]
    fn wrong_segment_count_is_malformed(
        segments in prop::collection::vec("[a-z0-9]{0,8}", 1..12usize)
            .prop_filter("4 or 5 segments", |s| s.len() < 4 || s.len() > 5)
    ) {
        let ethauth = EthAuth::new(vec![Validator::Eoa]).unwrap();
        let err = ethauth.decode_proof(&segments.join(".")).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Malformed);
        prop_assert!(err.proof().is_none());
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".{0,200}") {
        let ethauth = EthAuth::new(Validator::defaults()).unwrap();
        let _ = ethauth.decode_proof(&input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn tampered_claims_segment_is_rejected(seed in any::<[u8; 32]>(), index in any::<prop::sample::Index>(), pick in any::<usize>()) {
        let Some((ethauth, token)) = signed_token(seed) else {
            return Ok(());
        };
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let i = index.index(parts[2].len());
        parts[2] = replace_char(&parts[2], i, BASE64URL_ALPHABET, pick);

        prop_assert!(ethauth.decode_proof(&parts.join(".")).is_err());
    }

    #[test]
    fn tampered_signature_segment_is_rejected(seed in any::<[u8; 32]>(), index in any::<prop::sample::Index>(), pick in any::<usize>()) {
        let Some((ethauth, token)) = signed_token(seed) else {
            return Ok(());
        };
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        // Skip the 0x prefix.
        let i = 2 + index.index(parts[3].len() - 2);
        parts[3] = replace_char(&parts[3], i, HEX_DIGITS, pick);

        prop_assert!(ethauth.decode_proof(&parts.join(".")).is_err());
    }

    #[test]
    fn signed_token_round_trips(seed in any::<[u8; 32]>()) {
        let Some((ethauth, token)) = signed_token(seed) else {
            return Ok(());
        };
        let decoded = ethauth.decode_proof(&token).unwrap();
        prop_assert_eq!(decoded.address.to_lowercase(), decoded.address.clone());
        prop_assert_eq!(ethauth.encode_proof(&decoded).unwrap(), token);
    }
}
