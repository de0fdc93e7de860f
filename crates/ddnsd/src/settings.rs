//! Environment configuration for ddnsd
//!
//! ## Variables
//!
//! | Variable         | Values                                              | Default |
//! |------------------|-----------------------------------------------------|---------|
//! | `APIKEY`         | Porkbun API key (required)                          |         |
//! | `SECRETKEY`      | Porkbun secret API key (required)                   |         |
//! | `DOMAINS`        | Comma-separated FQDNs (required)                    |         |
//! | `IPV4`           | `true`, `false`                                     | `true`  |
//! | `IPV6`           | `false`, `fritzbox-ip`, `host-ip`, `prefix-only`    | `false` |
//! | `TIMEOUT`        | Seconds between cycles                              | `600`   |
//! | `INVALID_DOMAIN` | `halt`, `skip`                                      | `halt`  |
//! | `FRITZBOX_URL`   | TR-064 control URL                                  | fritz.box |
//! | `LOG_LEVEL`      | `trace`, `debug`, `info`, `warn`, `error`           | `info`  |
//!
//! Blank `DOMAINS` entries (`a.com,,b.com`) are kept and fail FQDN validation
//! at reconcile time like any other malformed name.

use anyhow::{Context, Result};
use ddns_core::config::{AddressMode, DdnsConfig, InvalidDomainPolicy, RegistrarConfig};
use tracing::Level;

/// Everything ddnsd reads from the environment
#[derive(Debug)]
pub struct Settings {
    pub config: DdnsConfig,
    pub log_level: Level,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup` (unset and empty are treated alike)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let api_key = get("APIKEY");
        if api_key.is_empty() {
            anyhow::bail!("APIKEY is required. Set it via: export APIKEY=pk1_...");
        }
        let secret_key = get("SECRETKEY");
        if secret_key.is_empty() {
            anyhow::bail!("SECRETKEY is required. Set it via: export SECRETKEY=sk1_...");
        }

        let raw_domains = get("DOMAINS");
        if raw_domains.is_empty() {
            anyhow::bail!(
                "DOMAINS must contain at least one domain. \
                Set it via: export DOMAINS=example.com,home.example.com"
            );
        }
        let domains: Vec<String> = raw_domains
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let mut config = DdnsConfig::new(domains, RegistrarConfig::new(api_key, secret_key));
        config.ipv4 = parse_ipv4_mode(&get("IPV4"))?;
        config.ipv6 = parse_ipv6_mode(&get("IPV6"))?;

        let timeout = get("TIMEOUT");
        if !timeout.is_empty() {
            config.engine.interval_secs = timeout
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .with_context(|| {
                    format!("TIMEOUT must be a positive number of seconds. Got: {}", timeout)
                })?;
        }

        config.engine.invalid_domain_policy = match get("INVALID_DOMAIN").as_str() {
            "" | "halt" => InvalidDomainPolicy::HaltBatch,
            "skip" => InvalidDomainPolicy::SkipDomain,
            other => anyhow::bail!(
                "INVALID_DOMAIN '{}' is not valid. Valid values: halt, skip",
                other
            ),
        };

        let router_url = get("FRITZBOX_URL");
        if !router_url.is_empty() {
            config.router.control_url = router_url;
        }

        let log_level = parse_log_level(&get("LOG_LEVEL"))?;

        config.validate()?;

        Ok(Self { config, log_level })
    }
}

fn parse_ipv4_mode(value: &str) -> Result<AddressMode> {
    match value {
        "" | "true" => Ok(AddressMode::FritzboxWan),
        "false" => Ok(AddressMode::Disabled),
        other => anyhow::bail!("IPV4 '{}' is not valid. Valid values: true, false", other),
    }
}

fn parse_ipv6_mode(value: &str) -> Result<AddressMode> {
    match value {
        "" | "false" => Ok(AddressMode::Disabled),
        "fritzbox-ip" => Ok(AddressMode::FritzboxWan),
        "host-ip" => Ok(AddressMode::HostIp),
        "prefix-only" => Ok(AddressMode::FritzboxPrefixOnly),
        other => anyhow::bail!(
            "IPV6 '{}' is not valid. Valid values: false, fritzbox-ip, host-ip, prefix-only",
            other
        ),
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "" | "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}
