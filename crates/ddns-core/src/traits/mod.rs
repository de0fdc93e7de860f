//! Collaborator traits for the DDNS system
//!
//! The engine only talks to the outside world through these interfaces.
//!
//! - [`AddressSource`]: Report the current WAN address or IPv6 prefix
//! - [`Registrar`]: List, create and edit address records at the registrar

pub mod address_source;
pub mod registrar;

pub use address_source::{AddressFamily, AddressSource};
pub use registrar::{ActiveRecord, RecordType, Registrar};
