//! Per-record reconciliation decisions
//!
//! Deciding is pure: it only looks at the desired address (or prefix) and
//! the records the registrar reported. Acting on a decision is the
//! engine's job.

use crate::combine;
use crate::error::Result;
use crate::traits::ActiveRecord;
use std::net::{IpAddr, Ipv6Addr};

/// What to do with one (domain, family) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No record exists; create one
    Create {
        /// Address for the new record
        address: IpAddr,
    },
    /// The single existing record points elsewhere; edit it
    Edit {
        /// Registrar record ID
        id: String,
        /// Current record content
        previous: String,
        /// Address to set
        address: IpAddr,
    },
    /// The single existing record is already correct
    UpToDate {
        /// The address the record points at
        address: IpAddr,
    },
    /// Several records exist; the operator has to deduplicate them
    AmbiguousMultiple(usize),
    /// Prefix-only tracking found no record to take an interface ID from
    MissingReference,
    /// Active records could not be listed
    RetrievalFailed(String),
}

impl Decision {
    /// Decide for a constant desired address
    pub fn for_address(desired: IpAddr, records: &[ActiveRecord]) -> Self {
        match records {
            [] => Decision::Create { address: desired },
            [record] if record.points_to(desired) => Decision::UpToDate { address: desired },
            [record] => Decision::Edit {
                id: record.id.clone(),
                previous: record.address.clone(),
                address: desired,
            },
            _ => Decision::AmbiguousMultiple(records.len()),
        }
    }

    /// Decide for prefix-only tracking
    ///
    /// The desired address is derived from the single existing record, so
    /// malformed record content fails with [`crate::Error::InvalidAddress`].
    pub fn for_prefix(prefix: Ipv6Addr, records: &[ActiveRecord]) -> Result<Self> {
        match records {
            [] => Ok(Decision::MissingReference),
            [record] => {
                let reference = combine::parse_ipv6(&record.address)?;
                let desired = IpAddr::V6(combine::splice(prefix, reference));
                Ok(Self::for_address(desired, records))
            }
            _ => Ok(Decision::AmbiguousMultiple(records.len())),
        }
    }
}
