//! Configuration for an `EthAuth` instance.

use serde::{Deserialize, Serialize};

use crate::claims::Presence;
use crate::constants::{ETHAUTH_DOMAIN_NAME, ETHAUTH_PREFIX, ETHAUTH_VERSION};
use crate::typed_data::{Canonicalizer, Domain};

/// Protocol settings for encoding and verifying proofs.
///
/// Deserializes from JSON with every key optional:
///
/// ```
/// use ethauth::{EthAuthConfig, Presence};
///
/// let config: EthAuthConfig =
///     serde_json::from_str(r#"{ "chain_id": 137, "presence": "explicit" }"#).unwrap();
///
/// assert_eq!(config.prefix, "eth");
/// assert_eq!(config.chain_id, Some(137));
/// assert_eq!(config.presence, Presence::Explicit);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthAuthConfig {
    /// Scheme tag expected in the first proof segment.
    ///
    /// Default: `"eth"`
    pub prefix: String,

    /// EIP-712 domain name.
    ///
    /// Default: `"ETHAuth"`
    pub domain_name: String,

    /// EIP-712 domain version.
    ///
    /// Default: `"1"`
    pub domain_version: String,

    /// Chain identifier passed to validators.
    ///
    /// Default: None
    pub chain_id: Option<u64>,

    /// How claim presence is decided.
    ///
    /// Default: `ZeroIsAbsent`
    pub presence: Presence,
}

impl Default for EthAuthConfig {
    fn default() -> Self {
        Self {
            prefix: ETHAUTH_PREFIX.to_string(),
            domain_name: ETHAUTH_DOMAIN_NAME.to_string(),
            domain_version: ETHAUTH_VERSION.to_string(),
            chain_id: None,
            presence: Presence::default(),
        }
    }
}

impl EthAuthConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scheme prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the EIP-712 domain.
    #[must_use]
    pub fn with_domain(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.domain_name = name.into();
        self.domain_version = version.into();
        self
    }

    /// Sets the chain identifier.
    #[must_use]
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Sets the presence mode.
    #[must_use]
    pub const fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Returns the configured signing domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        Domain::new(self.domain_name.clone(), self.domain_version.clone())
    }

    /// Builds the canonicalizer for this configuration.
    #[must_use]
    pub fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(self.domain(), self.presence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EthAuthConfig::default();
        assert_eq!(config.prefix, "eth");
        assert_eq!(config.domain_name, "ETHAuth");
        assert_eq!(config.domain_version, "1");
        assert!(config.chain_id.is_none());
        assert_eq!(config.presence, Presence::ZeroIsAbsent);
    }

    #[test]
    fn builder_pattern() {
        let config = EthAuthConfig::new()
            .with_prefix("test")
            .with_domain("Other", "2")
            .with_chain_id(5)
            .with_presence(Presence::Explicit);

        assert_eq!(config.prefix, "test");
        assert_eq!(config.domain(), Domain::new("Other", "2"));
        assert_eq!(config.chain_id, Some(5));
        assert_eq!(config.canonicalizer().presence(), Presence::Explicit);
    }

    #[test]
    fn deserialize_empty_object_gives_defaults() {
        let config: EthAuthConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EthAuthConfig::default());
    }

    #[test]
    fn deserialize_rejects_unknown_presence() {
        let result = serde_json::from_str::<EthAuthConfig>(r#"{ "presence": "sometimes" }"#);
        assert!(result.is_err());
    }
}
