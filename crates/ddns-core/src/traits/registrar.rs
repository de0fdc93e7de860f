// # Registrar Trait
//
// Defines the interface for reading and writing address records at the
// domain registrar.
//
// ## Implementations
//
// - Porkbun: `ddns-registrar-porkbun` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::domain::DomainName;
// use ddns_core::traits::{RecordType, Registrar};
//
// let registrar = /* Registrar implementation */;
// let name = DomainName::parse("home.example.com")?;
// let records = registrar.list_active(&name, RecordType::A).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::domain::DomainName;

/// DNS address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record currently present at the registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRecord {
    /// Registrar-specific record identifier
    pub id: String,
    /// Record content as reported by the registrar
    pub address: String,
}

impl ActiveRecord {
    /// Create a new active record
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }

    /// Whether the record already points at `addr`
    ///
    /// Compares parsed addresses so that different spellings of the same
    /// address (`2001:db8::0123` vs `2001:db8::123`) are equal. Content
    /// that does not parse is compared textually.
    pub fn points_to(&self, addr: IpAddr) -> bool {
        match self.address.trim().parse::<IpAddr>() {
            Ok(current) => current == addr,
            Err(_) => self.address == addr.to_string(),
        }
    }
}

/// Trait for registrar implementations
///
/// # Trust Level: Untrusted
///
/// Registrars execute exactly one API call per method invocation and
/// report success or failure. Deciding what to change, retrying and
/// handling duplicate records are owned by the `ReconcileEngine`.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// List the active records of `record_type` for `name`
    ///
    /// Zero, one or several records may be returned.
    async fn list_active(
        &self,
        name: &DomainName,
        record_type: RecordType,
    ) -> Result<Vec<ActiveRecord>, crate::Error>;

    /// Create a new record pointing at `address`
    async fn create(
        &self,
        name: &DomainName,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Point the existing record `record_id` at `address`
    async fn edit(
        &self,
        record_id: &str,
        name: &DomainName,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}
