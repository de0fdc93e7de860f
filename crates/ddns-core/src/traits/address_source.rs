// # Address Source Trait
//
// Defines the interface for retrieving the current WAN address.
//
// ## Implementations
//
// - FRITZ!Box TR-064: `ddns-ip-fritzbox` crate (addresses and IPv6 prefix)
// - Address echo service: `ddns-ip-http` crate (host addresses)
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{AddressFamily, AddressSource};
//
// let source = /* AddressSource implementation */;
// let ipv4 = source.current_address(AddressFamily::V4).await?;
// let prefix = source.current_prefix().await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use super::registrar::RecordType;

/// Address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// The address record type used for this family
    pub fn record_type(self) -> RecordType {
        match self {
            AddressFamily::V4 => RecordType::A,
            AddressFamily::V6 => RecordType::Aaaa,
        }
    }

    /// Whether `addr` belongs to this family
    pub fn matches(self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for address source implementations
///
/// Sources are observers: each call performs one request against the
/// router or service and reports what it saw. They never decide whether
/// a record needs changing and never retry.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get the current address of the given family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address, guaranteed to be of `family`
    /// - `Err(Error)`: If the address could not be determined
    async fn current_address(&self, family: AddressFamily) -> Result<IpAddr, crate::Error>;

    /// Get the current IPv6 network prefix
    ///
    /// Only the upper 64 bits of the returned address are meaningful.
    /// Sources without prefix visibility keep the default, which fails
    /// with [`crate::Error::Unsupported`].
    async fn current_prefix(&self) -> Result<Ipv6Addr, crate::Error> {
        Err(crate::Error::unsupported(format!(
            "{} cannot report an IPv6 prefix",
            self.source_name()
        )))
    }

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
