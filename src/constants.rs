//! Protocol constants for ETHAuth proofs.

/// Scheme tag carried in the first segment of every proof string.
pub const ETHAUTH_PREFIX: &str = "eth";

/// Current proof format version.
///
/// Written into the `v` claim and used as the EIP-712 domain version.
pub const ETHAUTH_VERSION: &str = "1";

/// EIP-712 domain name binding signatures to this protocol.
pub const ETHAUTH_DOMAIN_NAME: &str = "ETHAuth";

/// Allowed clock skew between proof producer and verifier, in seconds.
pub const CLOCK_DRIFT_SECS: i64 = 5 * 60;

/// Maximum proof lifetime, in seconds (365 days).
pub const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Length of a `0x`-prefixed hex account address.
pub const ADDRESS_HEX_LENGTH: usize = 42;

/// Length of a raw account address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Length of a recoverable secp256k1 signature (`r || s || v`).
pub const SIGNATURE_LENGTH: usize = 65;

/// EIP-1271 `isValidSignature(bytes32,bytes)` success value.
pub const EIP1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Function selector of `isValidSignature(bytes32,bytes)`.
///
/// EIP-1271 defines the success value as this selector, so the two constants
/// share their bytes.
pub const IS_VALID_SIGNATURE_SELECTOR: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Prefix of an Ethereum personal message (EIP-191 version `0x45`).
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Segment separator in the proof string.
pub const SEGMENT_SEPARATOR: &str = ".";
