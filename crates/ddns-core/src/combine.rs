//! IPv6 prefix / interface identifier combination
//!
//! When only the delegated network prefix is tracked, the record's full
//! address is rebuilt from the current prefix (upper 64 bits) and the
//! interface identifier already stored in the record (lower 64 bits).
//!
//! ```text
//! prefix     2001:0db8:0000:0000 : ....:....:....:....
//! reference  ....:....:....:.... : 5678:90ab:cdef:0123
//!            ─────────────────────────────────────────
//! combined   2001:0db8:0000:0000 : 5678:90ab:cdef:0123
//! ```

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv6Addr};

const INTERFACE_ID_MASK: u128 = u64::MAX as u128;
const PREFIX_MASK: u128 = !INTERFACE_ID_MASK;

/// Combine the network half of `prefix` with the interface half of `reference`
pub fn splice(prefix: Ipv6Addr, reference: Ipv6Addr) -> Ipv6Addr {
    let bits = (prefix.to_bits() & PREFIX_MASK) | (reference.to_bits() & INTERFACE_ID_MASK);
    Ipv6Addr::from_bits(bits)
}

/// Parse both inputs and [`splice`] them
///
/// Fails with [`Error::InvalidAddress`] when either input is not a
/// textual 128-bit address (IPv4 text is rejected, not mapped).
pub fn combine(prefix: &str, reference: &str) -> Result<Ipv6Addr> {
    Ok(splice(parse_ipv6(prefix)?, parse_ipv6(reference)?))
}

/// Parse `text` as an IPv6 address
pub fn parse_ipv6(text: &str) -> Result<Ipv6Addr> {
    match text.trim().parse::<IpAddr>() {
        Ok(IpAddr::V6(addr)) => Ok(addr),
        Ok(IpAddr::V4(addr)) => Err(Error::invalid_address(format!(
            "{} is an IPv4 address, expected 128 bits",
            addr
        ))),
        Err(_) => Err(Error::invalid_address(format!(
            "'{}' is not an IP address",
            text
        ))),
    }
}
