//! Kani proof harnesses for the claims validity window.
//!
//! # Running Proofs
//!
//! ```bash
//! cargo kani
//! ```
//!
//! # Properties Verified
//!
//! | Property | Harness |
//! |----------|---------|
//! | Never panics | `check_window_never_panics` |
//! | Deterministic | `check_window_is_deterministic` |
//! | Missing expiry fails | `missing_expiry_always_fails` |
//! | Future issue fails | `future_issue_always_fails` |
//! | In-window passes | `in_window_claims_pass` |
//! | Address parse safe | `address_from_bytes_roundtrip` |

#![cfg(kani)]

use crate::address::Address;
use crate::claims::check_window;
use crate::constants::{CLOCK_DRIFT_SECS, MAX_LIFETIME_SECS};
use crate::error::ClaimsError;

mod window_proofs {
    use super::*;

    /// Prove `check_window` never panics, even at the `i64` extremes.
    #[kani::proof]
    fn check_window_never_panics() {
        let iat: Option<i64> = kani::any();
        let exp: Option<i64> = kani::any();
        let now: i64 = kani::any();

        let _ = check_window(iat, exp, now);
    }

    /// Prove the window check is deterministic.
    #[kani::proof]
    fn check_window_is_deterministic() {
        let iat: Option<i64> = kani::any();
        let exp: Option<i64> = kani::any();
        let now: i64 = kani::any();

        assert_eq!(check_window(iat, exp, now), check_window(iat, exp, now));
    }

    /// Prove claims without an expiry are never accepted.
    #[kani::proof]
    fn missing_expiry_always_fails() {
        let iat: Option<i64> = kani::any();
        let now: i64 = kani::any();

        assert!(check_window(iat, None, now).is_err());
    }

    /// Prove an issue time beyond the drift allowance is always rejected as future.
    #[kani::proof]
    fn future_issue_always_fails() {
        let iat: i64 = kani::any();
        let exp: Option<i64> = kani::any();
        let now: i64 = kani::any();

        kani::assume(now < i64::MAX - CLOCK_DRIFT_SECS);
        kani::assume(iat > now + CLOCK_DRIFT_SECS);

        assert!(matches!(
            check_window(Some(iat), exp, now),
            Err(ClaimsError::IssuedInFuture { .. })
        ));
    }

    /// Prove claims issued now and expiring within the lifetime pass.
    #[kani::proof]
    fn in_window_claims_pass() {
        let now: i64 = kani::any();
        let ttl: i64 = kani::any();

        kani::assume(now > 0 && now < i64::MAX / 2);
        kani::assume(ttl >= 0 && ttl <= MAX_LIFETIME_SECS);

        assert!(check_window(Some(now), Some(now + ttl), now).is_ok());
    }
}

mod address_proofs {
    use super::*;

    /// Prove raw bytes survive a round trip through `Address`.
    #[kani::proof]
    fn address_from_bytes_roundtrip() {
        let bytes: [u8; 20] = kani::any();
        let address = Address::from_bytes(bytes);
        assert_eq!(*address.as_bytes(), bytes);
    }
}
