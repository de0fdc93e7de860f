// # HTTP Address Source
//
// This crate provides the host's own address by asking an echo service
// (e.g., api.ipify.org) which address the request came from.
//
// ## Purpose
//
// Used for the `host-ip` mode: the record follows this machine's global
// address instead of the router's. The router is not involved.
//
// ## Address Family Selection
//
// Each family has its own client bound to that family's unspecified local
// address (`0.0.0.0` or `::`), so a dual-stack echo service always sees
// the requested family.
//
// ## Response Format
//
// Plain text (`203.0.113.7`) and JSON (`{"ip": "203.0.113.7"}`) bodies
// are both accepted.

use ddns_core::config::HostIpConfig;
use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::{Error, Result};
use serde::Deserialize;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// HTTP timeout for echo requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct JsonEcho {
    ip: String,
}

/// Parse an echo service response body
pub fn parse_echo(body: &str) -> Result<IpAddr> {
    let body = body.trim();

    let text = if body.starts_with('{') {
        serde_json::from_str::<JsonEcho>(body)?.ip
    } else {
        body.to_string()
    };

    text.trim()
        .parse()
        .map_err(|_| Error::address_source(format!("Invalid IP address: {}", text)))
}

/// Address source backed by an HTTP echo service
pub struct HttpAddressSource {
    /// Echo URL for IPv4
    ipv4_url: String,

    /// Echo URL for IPv6
    ipv6_url: String,

    /// Client bound to 0.0.0.0
    ipv4_client: reqwest::Client,

    /// Client bound to ::
    ipv6_client: reqwest::Client,
}

impl std::fmt::Debug for HttpAddressSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAddressSource")
            .field("ipv4_url", &self.ipv4_url)
            .field("ipv6_url", &self.ipv6_url)
            .finish()
    }
}

impl HttpAddressSource {
    /// Create a new HTTP address source
    ///
    /// # Parameters
    ///
    /// - `config`: Echo URLs per family (e.g., "https://api64.ipify.org")
    pub fn new(config: &HostIpConfig) -> Result<Self> {
        Ok(Self {
            ipv4_url: config.ipv4_url.clone(),
            ipv6_url: config.ipv6_url.clone(),
            ipv4_client: bound_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            ipv6_client: bound_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED))?,
        })
    }

    /// Fetch the current address of `family` from its echo service
    async fn fetch_ip(&self, family: AddressFamily) -> Result<IpAddr> {
        let (client, url) = match family {
            AddressFamily::V4 => (&self.ipv4_client, &self.ipv4_url),
            AddressFamily::V6 => (&self.ipv6_client, &self.ipv6_url),
        };

        tracing::debug!("Fetching host {} address from {}", family, url);

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::address_source(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::address_source(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::address_source(format!("Failed to read response: {}", e)))?;

        let ip = parse_echo(&body)?;

        if !family.matches(&ip) {
            return Err(Error::address_source(format!(
                "Expected {}, got: {}",
                family, ip
            )));
        }

        Ok(ip)
    }
}

fn bound_client(local: IpAddr) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .local_address(local)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn current_address(&self, family: AddressFamily) -> Result<IpAddr> {
        self.fetch_ip(family).await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
