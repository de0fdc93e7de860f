// # ddns-core
//
// Core library for the polling DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the reconciliation logic for dynamic DNS records
// kept at a domain registrar:
// - **AddressSource**: Trait for reading the current WAN address or IPv6 prefix
// - **Registrar**: Trait for listing, creating and editing address records
// - **ReconcileEngine**: Polls the sources and converges every configured
//   (domain, family) pair towards the observed address
// - **domain / combine / retry**: Pure helpers the engine is built from
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Stateless Cycles**: Every decision is derived from the registrar's
//    current records, nothing is cached between cycles
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Isolated Failures**: One failing pair never aborts the cycle

pub mod combine;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod retry;
pub mod traits;

// Re-export core types for convenience
pub use config::{AddressMode, DdnsConfig, EngineConfig, InvalidDomainPolicy, RegistrarConfig};
pub use domain::DomainName;
pub use engine::{CycleReport, Decision, PairOutcome, ReconcileEngine};
pub use error::{Error, Result};
pub use traits::{ActiveRecord, AddressFamily, AddressSource, RecordType, Registrar};
