//! EIP-712 canonicalization of claims.
//!
//! Claims are hashed as an EIP-712 struct named `Claims` whose member list
//! contains only the present claims, in the fixed order
//! `app, iat, exp, n, typ, ogn, v`. The struct hash is bound to a domain
//! `EIP712Domain(string name,string version)`.
//!
//! ```text
//! digest = keccak256(0x19 || 0x01 || domainSeparator || hashStruct(claims))
//! ```

use std::fmt;

use crate::claims::{Claims, Presence};
use crate::constants::{ETHAUTH_DOMAIN_NAME, ETHAUTH_VERSION};
use crate::error::ClaimsError;
use crate::hashing::keccak256;

const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version)";

/// Name of the primary EIP-712 type.
pub const CLAIMS_TYPE_NAME: &str = "Claims";

/// EIP-712 signing domain.
///
/// Separates ETHAuth signatures from any other typed-data signature a wallet
/// might produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    name: String,
    version: String,
}

impl Domain {
    /// Creates a domain with the given name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns the domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the domain version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Computes the EIP-712 domain separator.
    #[must_use]
    pub fn separator(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(96);
        buf.extend_from_slice(&keccak256(DOMAIN_TYPE.as_bytes()));
        buf.extend_from_slice(&keccak256(self.name.as_bytes()));
        buf.extend_from_slice(&keccak256(self.version.as_bytes()));
        keccak256(&buf)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(ETHAUTH_DOMAIN_NAME, ETHAUTH_VERSION)
    }
}

/// Solidity type of a claim member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `string`
    String,
    /// `int64`
    Int64,
    /// `uint64`
    Uint64,
}

impl FieldType {
    /// Returns the Solidity type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a claim member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// A string claim
    String(String),
    /// A signed 64-bit claim
    Int64(i64),
    /// An unsigned 64-bit claim
    Uint64(u64),
}

impl FieldValue {
    /// Returns the Solidity type of this value.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::String(_) => FieldType::String,
            Self::Int64(_) => FieldType::Int64,
            Self::Uint64(_) => FieldType::Uint64,
        }
    }

    /// Encodes the value as a 32-byte EIP-712 member.
    ///
    /// Strings are hashed; integers are left-padded big-endian, with
    /// negative `int64` values sign-extended.
    #[must_use]
    pub fn encode(&self) -> [u8; 32] {
        match self {
            Self::String(s) => keccak256(s.as_bytes()),
            Self::Int64(v) => {
                let mut word = if *v < 0 { [0xff; 32] } else { [0u8; 32] };
                word[24..].copy_from_slice(&v.to_be_bytes());
                word
            }
            Self::Uint64(v) => {
                let mut word = [0u8; 32];
                word[24..].copy_from_slice(&v.to_be_bytes());
                word
            }
        }
    }
}

/// One entry of the `Claims` type schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedField {
    /// Member name (the wire key)
    pub name: &'static str,
    /// Member type
    pub field_type: FieldType,
}

/// A present claim with its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimField {
    /// Member name (the wire key)
    pub name: &'static str,
    /// Member value
    pub value: FieldValue,
}

/// EIP-712 typed data for a claims value: domain, schema and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedData {
    domain: Domain,
    fields: Vec<ClaimField>,
}

impl TypedData {
    /// Builds typed data from the claims present under `presence`.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Empty` if no claim is present.
    pub fn from_claims(
        claims: &Claims,
        domain: Domain,
        presence: Presence,
    ) -> Result<Self, ClaimsError> {
        let c = claims.normalized(presence);
        let mut fields = Vec::with_capacity(7);
        let mut push = |name: &'static str, value: Option<FieldValue>| {
            if let Some(value) = value {
                fields.push(ClaimField { name, value });
            }
        };
        push("app", c.app.map(FieldValue::String));
        push("iat", c.issued_at.map(FieldValue::Int64));
        push("exp", c.expires_at.map(FieldValue::Int64));
        push("n", c.nonce.map(FieldValue::Uint64));
        push("typ", c.typ.map(FieldValue::String));
        push("ogn", c.origin.map(FieldValue::String));
        push("v", c.version.map(FieldValue::String));

        if fields.is_empty() {
            return Err(ClaimsError::Empty);
        }
        Ok(Self { domain, fields })
    }

    /// Returns the signing domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the primary type name.
    #[must_use]
    pub fn primary_type(&self) -> &'static str {
        CLAIMS_TYPE_NAME
    }

    /// Returns the `Claims` schema: one entry per present claim.
    #[must_use]
    pub fn schema(&self) -> Vec<TypedField> {
        self.fields
            .iter()
            .map(|f| TypedField {
                name: f.name,
                field_type: f.value.field_type(),
            })
            .collect()
    }

    /// Returns the message: present claims with their values, in schema order.
    #[must_use]
    pub fn message(&self) -> &[ClaimField] {
        &self.fields
    }

    /// Returns the EIP-712 type encoding, e.g. `Claims(string app,int64 exp)`.
    #[must_use]
    pub fn encode_type(&self) -> String {
        let members: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.value.field_type(), f.name))
            .collect();
        format!("{CLAIMS_TYPE_NAME}({})", members.join(","))
    }

    /// Returns the hash of the type encoding.
    #[must_use]
    pub fn type_hash(&self) -> [u8; 32] {
        keccak256(self.encode_type().as_bytes())
    }

    /// Returns the EIP-712 struct hash of the message.
    #[must_use]
    pub fn hash_struct(&self) -> [u8; 32] {
        let mut buf = Vec::with_capacity(32 * (self.fields.len() + 1));
        buf.extend_from_slice(&self.type_hash());
        for field in &self.fields {
            buf.extend_from_slice(&field.value.encode());
        }
        keccak256(&buf)
    }

    /// Computes the 32-byte signing digest.
    #[must_use]
    pub fn encode_digest(&self) -> [u8; 32] {
        digest_with_separator(&self.domain.separator(), &self.hash_struct())
    }
}

fn digest_with_separator(separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(separator);
    buf[34..].copy_from_slice(struct_hash);
    keccak256(&buf)
}

/// Turns claims into the digest a signer must sign.
///
/// Holds the signing domain and presence mode as immutable configuration, so
/// canonicalizers for different protocol versions can coexist.
///
/// # Example
///
/// ```
/// use ethauth::{Canonicalizer, Claims, Domain, Presence};
/// use std::time::Duration;
///
/// let claims = Claims::builder()
///     .app("ExampleApp")
///     .ttl(Duration::from_secs(300))
///     .build()
///     .unwrap();
///
/// let canonicalizer = Canonicalizer::new(Domain::default(), Presence::ZeroIsAbsent);
/// let digest = canonicalizer.digest(&claims).unwrap();
/// assert_eq!(digest, claims.message_digest().unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalizer {
    domain: Domain,
    presence: Presence,
    separator: [u8; 32],
}

impl Canonicalizer {
    /// Creates a canonicalizer for `domain` and `presence`.
    #[must_use]
    pub fn new(domain: Domain, presence: Presence) -> Self {
        let separator = domain.separator();
        Self {
            domain,
            presence,
            separator,
        }
    }

    /// Returns the signing domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the presence mode.
    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Builds typed data for `claims` without checking validity.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Empty` if no claim is present.
    pub fn typed_data(&self, claims: &Claims) -> Result<TypedData, ClaimsError> {
        TypedData::from_claims(claims, self.domain.clone(), self.presence)
    }

    /// Computes the signing digest of `claims`.
    ///
    /// # Errors
    ///
    /// Returns a `ClaimsError` if the claims are not currently valid.
    pub fn digest(&self, claims: &Claims) -> Result<[u8; 32], ClaimsError> {
        claims.valid()?;
        let typed = self.typed_data(claims)?;
        Ok(digest_with_separator(&self.separator, &typed.hash_struct()))
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(Domain::default(), Presence::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Claims {
        Claims {
            app: Some("SkyWeaver".into()),
            issued_at: Some(1_600_000_000),
            expires_at: Some(1_600_000_300),
            version: Some("1".into()),
            ..Claims::default()
        }
    }

    #[test]
    fn schema_lists_present_fields_in_order() {
        let mut claims = sample();
        claims.origin = Some("example.com".into());
        claims.nonce = Some(9);

        let typed = claims.typed_data().unwrap();
        let names: Vec<&str> = typed.schema().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["app", "iat", "exp", "n", "ogn", "v"]);
        assert_eq!(
            typed.encode_type(),
            "Claims(string app,int64 iat,int64 exp,uint64 n,string ogn,string v)"
        );
    }

    #[test]
    fn zero_nonce_changes_schema_only_in_explicit_mode() {
        let mut claims = sample();
        claims.nonce = Some(0);

        let legacy = TypedData::from_claims(&claims, Domain::default(), Presence::ZeroIsAbsent)
            .unwrap();
        let explicit =
            TypedData::from_claims(&claims, Domain::default(), Presence::Explicit).unwrap();

        assert_eq!(legacy, sample().typed_data().unwrap());
        assert_ne!(legacy.encode_digest(), explicit.encode_digest());
        assert!(explicit.encode_type().contains("uint64 n"));
    }

    #[test]
    fn unset_optional_field_does_not_change_digest() {
        let mut claims = sample();
        claims.typ = Some(String::new());
        assert_eq!(
            claims.typed_data().unwrap().encode_digest(),
            sample().typed_data().unwrap().encode_digest()
        );
    }

    #[test]
    fn empty_claims_are_rejected() {
        assert_eq!(
            Claims::default().typed_data().unwrap_err(),
            ClaimsError::Empty
        );
    }

    #[test]
    fn domain_changes_digest() {
        let claims = sample();
        let v1 = TypedData::from_claims(&claims, Domain::default(), Presence::default()).unwrap();
        let v2 = TypedData::from_claims(&claims, Domain::new("ETHAuth", "2"), Presence::default())
            .unwrap();
        assert_ne!(v1.encode_digest(), v2.encode_digest());
    }

    #[test]
    fn digest_is_deterministic() {
        let a = sample().typed_data().unwrap().encode_digest();
        let b = sample().typed_data().unwrap().encode_digest();
        assert_eq!(a, b);
    }

    #[test]
    fn digest_rejects_invalid_claims() {
        // sample() expired long ago
        let result = Canonicalizer::default().digest(&sample());
        assert!(matches!(result, Err(ClaimsError::Expired { .. })));
    }

    #[test]
    fn integer_encoding() {
        let neg = FieldValue::Int64(-1).encode();
        assert_eq!(neg, [0xff; 32]);

        let pos = FieldValue::Uint64(258).encode();
        assert_eq!(pos[30..], [0x01, 0x02]);
        assert!(pos[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn string_encoding_is_hash() {
        assert_eq!(
            FieldValue::String("abc".into()).encode(),
            keccak256(b"abc")
        );
    }

    #[test]
    fn hash_struct_matches_manual_encoding() {
        let claims = Claims {
            app: Some("app".into()),
            version: Some("1".into()),
            ..Claims::default()
        };
        let typed = claims.typed_data().unwrap();

        let mut buf = Vec::new();
        buf.extend_from_slice(&keccak256(b"Claims(string app,string v)"));
        buf.extend_from_slice(&keccak256(b"app"));
        buf.extend_from_slice(&keccak256(b"1"));
        assert_eq!(typed.hash_struct(), keccak256(&buf));

        let mut raw = vec![0x19, 0x01];
        raw.extend_from_slice(&Domain::default().separator());
        raw.extend_from_slice(&typed.hash_struct());
        assert_eq!(typed.encode_digest(), keccak256(&raw));
    }
}
