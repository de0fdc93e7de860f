//! Configuration types for the DDNS system
//!
//! The daemon builds a [`DdnsConfig`] once at startup and hands it to the
//! engine; nothing in this crate reads the process environment.

use crate::traits::AddressFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Porkbun JSON API base URL
pub const DEFAULT_REGISTRAR_BASE_URL: &str = "https://api.porkbun.com/api/json/v3";

/// Default FRITZ!Box `WANIPConnection:1` control URL
pub const DEFAULT_ROUTER_CONTROL_URL: &str = "http://fritz.box:49000/igdupnp/control/WANIPConn1";

/// Default echo service for host IPv4 addresses
pub const DEFAULT_HOST_IPV4_URL: &str = "https://api.ipify.org";

/// Default echo service for host IPv6 addresses
pub const DEFAULT_HOST_IPV6_URL: &str = "https://api64.ipify.org";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Fully qualified domain names to keep in sync
    pub domains: Vec<String>,

    /// How the IPv4 address is tracked
    #[serde(default = "default_ipv4_mode")]
    pub ipv4: AddressMode,

    /// How the IPv6 address is tracked
    #[serde(default)]
    pub ipv6: AddressMode,

    /// Registrar credentials and endpoint
    pub registrar: RegistrarConfig,

    /// Router (TR-064) endpoint
    #[serde(default)]
    pub router: RouterConfig,

    /// Address echo endpoints for host addresses
    #[serde(default)]
    pub host_ip: HostIpConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default modes and engine settings
    pub fn new(domains: Vec<String>, registrar: RegistrarConfig) -> Self {
        Self {
            domains,
            ipv4: default_ipv4_mode(),
            ipv6: AddressMode::default(),
            registrar,
            router: RouterConfig::default(),
            host_ip: HostIpConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        if !self.ipv4.supports(AddressFamily::V4) {
            return Err(crate::Error::config(format!(
                "IPv4 does not support mode '{}'",
                self.ipv4
            )));
        }

        if self.ipv4 == AddressMode::Disabled && self.ipv6 == AddressMode::Disabled {
            return Err(crate::Error::config(
                "Both IPv4 and IPv6 updates are disabled, nothing to do",
            ));
        }

        self.registrar.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// How one address family is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressMode {
    /// No records of this family are touched
    #[default]
    Disabled,
    /// WAN address as reported by the router
    FritzboxWan,
    /// The host's own global address, seen through an echo service
    HostIp,
    /// Router's delegated prefix combined with each record's interface ID
    FritzboxPrefixOnly,
}

impl AddressMode {
    /// Whether this mode can be used for `family`
    pub fn supports(self, family: AddressFamily) -> bool {
        match family {
            AddressFamily::V4 => matches!(self, AddressMode::Disabled | AddressMode::FritzboxWan),
            AddressFamily::V6 => true,
        }
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressMode::Disabled => "disabled",
            AddressMode::FritzboxWan => "fritzbox-wan",
            AddressMode::HostIp => "host-ip",
            AddressMode::FritzboxPrefixOnly => "fritzbox-prefix-only",
        };
        f.write_str(name)
    }
}

fn default_ipv4_mode() -> AddressMode {
    AddressMode::FritzboxWan
}

/// Registrar configuration
///
/// The Debug implementation intentionally does NOT expose the keys.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Public API key
    pub api_key: String,

    /// Secret API key
    pub secret_key: String,

    /// API base URL
    #[serde(default = "default_registrar_base_url")]
    pub base_url: String,
}

impl RegistrarConfig {
    /// Create a registrar configuration for the default endpoint
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            base_url: default_registrar_base_url(),
        }
    }

    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(crate::Error::config("Registrar API key cannot be empty"));
        }
        if self.secret_key.is_empty() {
            return Err(crate::Error::config("Registrar secret key cannot be empty"));
        }
        if self.base_url.is_empty() {
            return Err(crate::Error::config("Registrar base URL cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("api_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_registrar_base_url() -> String {
    DEFAULT_REGISTRAR_BASE_URL.to_string()
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// TR-064 control URL of the `WANIPConnection:1` service
    pub control_url: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            control_url: DEFAULT_ROUTER_CONTROL_URL.to_string(),
        }
    }
}

/// Echo service configuration for host addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostIpConfig {
    /// URL answering with the caller's IPv4 address as plain text
    pub ipv4_url: String,

    /// URL answering with the caller's IPv6 address as plain text
    pub ipv6_url: String,
}

impl Default for HostIpConfig {
    fn default() -> Self {
        Self {
            ipv4_url: DEFAULT_HOST_IPV4_URL.to_string(),
            ipv6_url: DEFAULT_HOST_IPV6_URL.to_string(),
        }
    }
}

/// What the engine does when a configured domain name is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidDomainPolicy {
    /// Stop processing the remaining domains of the current family pass
    #[default]
    HaltBatch,
    /// Skip only the malformed domain
    SkipDomain,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds to sleep between reconciliation cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Attempts for creating a record
    #[serde(default = "default_create_attempts")]
    pub create_attempts: usize,

    /// Attempts for editing a record (no delay between attempts)
    #[serde(default = "default_edit_attempts")]
    pub edit_attempts: usize,

    /// Reaction to malformed domain names
    #[serde(default)]
    pub invalid_domain_policy: InvalidDomainPolicy,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Polling interval must be > 0"));
        }
        if self.create_attempts == 0 {
            return Err(crate::Error::config("Create attempts must be >= 1"));
        }
        if self.edit_attempts == 0 {
            return Err(crate::Error::config("Edit attempts must be >= 1"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            create_attempts: default_create_attempts(),
            edit_attempts: default_edit_attempts(),
            invalid_domain_policy: InvalidDomainPolicy::default(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_create_attempts() -> usize {
    1
}

fn default_edit_attempts() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> DdnsConfig {
        DdnsConfig::new(
            vec!["home.example.com".to_string()],
            RegistrarConfig::new("pk1_key", "sk1_secret"),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = sample_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.ipv4, AddressMode::FritzboxWan);
        assert_eq!(config.ipv6, AddressMode::Disabled);
        assert_eq!(config.engine.edit_attempts, 3);
        assert_eq!(config.engine.create_attempts, 1);
        assert_eq!(config.engine.interval_secs, 600);
    }

    #[test]
    fn rejects_both_families_disabled() {
        let mut config = sample_config();
        config.ipv4 = AddressMode::Disabled;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_ipv6_only_modes_for_ipv4() {
        let mut config = sample_config();
        config.ipv4 = AddressMode::FritzboxPrefixOnly;
        assert!(config.validate().is_err());

        config.ipv4 = AddressMode::HostIp;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_domains_and_keys() {
        let mut config = sample_config();
        config.domains.clear();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.registrar.secret_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_attempts() {
        let mut config = sample_config();
        config.engine.edit_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_hides_keys() {
        let debug = format!("{:?}", sample_config().registrar);
        assert!(!debug.contains("pk1_key"));
        assert!(!debug.contains("sk1_secret"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DdnsConfig = serde_json::from_value(serde_json::json!({
            "domains": ["example.com"],
            "ipv6": "fritzbox-prefix-only",
            "registrar": { "api_key": "pk1", "secret_key": "sk1" },
        }))
        .unwrap();

        assert_eq!(config.ipv4, AddressMode::FritzboxWan);
        assert_eq!(config.ipv6, AddressMode::FritzboxPrefixOnly);
        assert_eq!(config.registrar.base_url, DEFAULT_REGISTRAR_BASE_URL);
        assert_eq!(config.router.control_url, DEFAULT_ROUTER_CONTROL_URL);
        assert_eq!(
            config.engine.invalid_domain_policy,
            InvalidDomainPolicy::HaltBatch
        );
    }
}
