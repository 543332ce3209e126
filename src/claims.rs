//! Proof claims and their validity rules.

use std::io;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CLOCK_DRIFT_SECS, ETHAUTH_VERSION, MAX_LIFETIME_SECS};
use crate::error::ClaimsError;
use crate::typed_data::{Canonicalizer, TypedData};

/// How claim presence is decided when canonicalizing and serializing.
///
/// Proofs in circulation treat a zero value (`0`, `""`) as an absent claim.
/// That drops a legitimate `n = 0` from the signed schema, so `Explicit`
/// tracks presence through `Option` alone and signs explicit zeros.
/// Both sides of an exchange must agree on the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// A claim set to its zero value is omitted (wire-compatible default).
    #[default]
    ZeroIsAbsent,
    /// A claim is present iff it is `Some`, whatever its value.
    Explicit,
}

/// The signable payload of a proof.
///
/// Every field is optional on the wire. Absent fields are left out of both
/// the JSON segment and the EIP-712 schema, which lets new optional claims
/// be added without changing the digest of proofs that never set them.
///
/// # Example
///
/// ```
/// use ethauth::Claims;
/// use std::time::Duration;
///
/// let claims = Claims::builder()
///     .app("ExampleApp")
///     .ttl(Duration::from_secs(300))
///     .build()
///     .unwrap();
///
/// assert!(claims.valid().is_ok());
/// assert_eq!(claims.version.as_deref(), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuing application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Issued-at, unix seconds
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Expiry, unix seconds
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Nonce
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Classification tag
    #[serde(rename = "typ", default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Origin or audience tag
    #[serde(rename = "ogn", default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Proof format version
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Claims {
    /// Creates a new builder for claims.
    #[must_use]
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }

    /// Sets `iat` to the current time.
    pub fn set_issued_at_now(&mut self) {
        self.issued_at = Some(Utc::now().timestamp());
    }

    /// Sets `exp` to `ttl` from now.
    pub fn set_expiry_in(&mut self, ttl: Duration) {
        self.expires_at = Some(Utc::now().timestamp().saturating_add(secs(ttl)));
    }

    /// Checks the claims against the current clock.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule; see [`Claims::valid_at`].
    pub fn valid(&self) -> Result<(), ClaimsError> {
        self.valid_at(Utc::now().timestamp())
    }

    /// Checks the claims against the clock value `now` (unix seconds).
    ///
    /// Rules, with drift `D` = 300s and maximum lifetime `M` = 365 days:
    /// `v` and `app` must be set; `iat > now + D` is issued from the future;
    /// `exp` unset, `exp < now - D`, `exp > now + D + M` or
    /// `iat < now - (D + M)` is expired.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::MissingVersion`, `ClaimsError::MissingApp`,
    /// `ClaimsError::IssuedInFuture` or `ClaimsError::Expired`.
    pub fn valid_at(&self, now: i64) -> Result<(), ClaimsError> {
        if is_blank(self.version.as_deref()) {
            return Err(ClaimsError::MissingVersion);
        }
        if is_blank(self.app.as_deref()) {
            return Err(ClaimsError::MissingApp);
        }
        check_window(self.issued_at, self.expires_at, now)
    }

    /// Returns a copy with every claim that counts as absent under
    /// `presence` set to `None`.
    #[must_use]
    pub fn normalized(&self, presence: Presence) -> Self {
        match presence {
            Presence::Explicit => self.clone(),
            Presence::ZeroIsAbsent => Self {
                app: self.app.clone().filter(|s| !s.is_empty()),
                issued_at: self.issued_at.filter(|&v| v != 0),
                expires_at: self.expires_at.filter(|&v| v != 0),
                nonce: self.nonce.filter(|&v| v != 0),
                typ: self.typ.clone().filter(|s| !s.is_empty()),
                origin: self.origin.clone().filter(|s| !s.is_empty()),
                version: self.version.clone().filter(|s| !s.is_empty()),
            },
        }
    }

    /// Returns the present claims as a JSON object keyed by wire name.
    #[must_use]
    pub fn to_map(&self, presence: Presence) -> Map<String, Value> {
        let claims = self.normalized(presence);
        let mut map = Map::new();
        if let Some(app) = claims.app {
            map.insert("app".to_string(), Value::from(app));
        }
        if let Some(iat) = claims.issued_at {
            map.insert("iat".to_string(), Value::from(iat));
        }
        if let Some(exp) = claims.expires_at {
            map.insert("exp".to_string(), Value::from(exp));
        }
        if let Some(n) = claims.nonce {
            map.insert("n".to_string(), Value::from(n));
        }
        if let Some(typ) = claims.typ {
            map.insert("typ".to_string(), Value::from(typ));
        }
        if let Some(ogn) = claims.origin {
            map.insert("ogn".to_string(), Value::from(ogn));
        }
        if let Some(v) = claims.version {
            map.insert("v".to_string(), Value::from(v));
        }
        map
    }

    /// Serializes the present claims to the JSON carried in a proof string.
    ///
    /// Keys appear in the order `app, iat, exp, n, typ, ogn, v`. Strings are
    /// written with `<`, `>`, `&`, U+2028 and U+2029 as `\u` escapes, so the
    /// claims segment is byte-identical to the one existing issuers produce.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot occur for these field types.
    pub fn to_json(&self, presence: Presence) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, HtmlSafeFormatter);
        self.normalized(presence).serialize(&mut serializer)?;
        Ok(out)
    }

    /// Builds the EIP-712 typed data for these claims under the default domain.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Empty` if no claim is present.
    pub fn typed_data(&self) -> Result<TypedData, ClaimsError> {
        Canonicalizer::default().typed_data(self)
    }

    /// Computes the EIP-712 digest of these claims under the default domain.
    ///
    /// # Errors
    ///
    /// Returns a `ClaimsError` if the claims are not currently valid.
    pub fn message_digest(&self) -> Result<[u8; 32], ClaimsError> {
        Canonicalizer::default().digest(self)
    }
}

/// Compact JSON formatter that also escapes HTML-significant characters and
/// the JavaScript line separators.
struct HtmlSafeFormatter;

impl serde_json::ser::Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

fn secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

/// Applies the issued-at and expiry window rules.
pub(crate) fn check_window(
    issued_at: Option<i64>,
    expires_at: Option<i64>,
    now: i64,
) -> Result<(), ClaimsError> {
    let max = CLOCK_DRIFT_SECS + MAX_LIFETIME_SECS;
    let expired = || ClaimsError::Expired { expires_at, now };

    if let Some(iat) = issued_at {
        if iat > now.saturating_add(CLOCK_DRIFT_SECS) {
            return Err(ClaimsError::IssuedInFuture { issued_at: iat, now });
        }
    }
    let Some(exp) = expires_at else {
        return Err(expired());
    };
    if exp < now.saturating_sub(CLOCK_DRIFT_SECS) || exp > now.saturating_add(max) {
        return Err(expired());
    }
    match issued_at {
        Some(iat) if iat >= now.saturating_sub(max) => Ok(()),
        _ => Err(expired()),
    }
}

/// Builder for constructing [`Claims`].
///
/// `iat` is stamped at build time and `v` defaults to the current format
/// version.
///
/// # Example
///
/// ```
/// use ethauth::ClaimsBuilder;
/// use std::time::Duration;
///
/// let claims = ClaimsBuilder::new()
///     .app("ExampleApp")
///     .nonce(7)
///     .typ("login")
///     .origin("https://example.com")
///     .ttl(Duration::from_secs(3600))
///     .build()
///     .unwrap();
///
/// assert_eq!(claims.nonce, Some(7));
/// ```
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    app: Option<String>,
    nonce: Option<u64>,
    typ: Option<String>,
    origin: Option<String>,
    version: String,
    ttl: Duration,
}

impl ClaimsBuilder {
    /// Creates a new builder with a default TTL of 24 hours.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: None,
            nonce: None,
            typ: None,
            origin: None,
            version: ETHAUTH_VERSION.to_string(),
            ttl: Duration::from_secs(86400),
        }
    }

    /// Sets the issuing application.
    #[must_use]
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the classification tag.
    #[must_use]
    pub fn typ(mut self, typ: impl Into<String>) -> Self {
        self.typ = Some(typ.into());
        self
    }

    /// Sets the origin tag.
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Overrides the format version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the time-to-live.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builds the claims.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::MissingApp` if no application was set.
    pub fn build(self) -> Result<Claims, ClaimsError> {
        let app = self.app.ok_or(ClaimsError::MissingApp)?;
        let now = Utc::now().timestamp();

        Ok(Claims {
            app: Some(app),
            issued_at: Some(now),
            expires_at: Some(now.saturating_add(secs(self.ttl))),
            nonce: self.nonce,
            typ: self.typ,
            origin: self.origin,
            version: Some(self.version),
        })
    }
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
