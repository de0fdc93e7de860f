//! Core reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Resolving the desired address (or prefix) per enabled family
//! - Listing the active records of every configured domain
//! - Deciding between create, edit, skip and warn
//! - Executing creates and edits with bounded retries
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   address / prefix
//! │ AddressSource │────────────────────┐
//! └───────────────┘                    │
//!                                      ▼
//!                             ┌─────────────────┐
//!                             │ ReconcileEngine │
//!                             └─────────────────┘
//!                                      │
//!            ┌─────────────────────────┼─────────────────────────┐
//!            │                         │                         │
//!            ▼                         ▼                         ▼
//!     ┌─────────────┐          ┌──────────────┐          ┌──────────────┐
//!     │ list_active │          │   Decision   │          │ create / edit│
//!     │ (Registrar) │          │    (pure)    │          │ (Registrar)  │
//!     └─────────────┘          └──────────────┘          └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. For each enabled family, fetch the address (or prefix) once
//! 2. For each domain: validate, list active records, decide, act
//! 3. Collect every outcome into a [`CycleReport`]
//!
//! Nothing is carried over between cycles. Every decision is derived
//! from the registrar's current record set.

pub mod decision;

pub use decision::Decision;

use crate::config::{AddressMode, DdnsConfig, EngineConfig, InvalidDomainPolicy};
use crate::domain::DomainName;
use crate::error::{Error, Result};
use crate::retry::{Exhausted, Succeeded, retry};
use crate::traits::{AddressFamily, AddressSource, RecordType, Registrar};
use std::future::Future;
use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a family's records should point at during one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The same address for every domain
    Address(IpAddr),
    /// A prefix combined with each record's own interface identifier
    Prefix(Ipv6Addr),
}

/// Result of processing one (domain, family) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    /// A new record was created
    Created { address: IpAddr },
    /// The existing record was edited
    Edited {
        previous: String,
        address: IpAddr,
        attempts: usize,
    },
    /// Nothing to do
    UpToDate { address: IpAddr },
    /// Several records exist and were left untouched
    Ambiguous { count: usize },
    /// Prefix-only tracking found no record to derive an address from
    MissingReference,
    /// The domain name is malformed
    InvalidDomain,
    /// Active records could not be listed
    RetrievalFailed { reason: String },
    /// Create or edit failed after all allotted attempts
    MutationFailed { reason: String },
    /// The desired address could not be computed
    AddressComputeFailed { reason: String },
}

impl PairOutcome {
    /// Whether this outcome counts as a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PairOutcome::InvalidDomain
                | PairOutcome::RetrievalFailed { .. }
                | PairOutcome::MutationFailed { .. }
                | PairOutcome::AddressComputeFailed { .. }
        )
    }
}

/// Outcome for one domain and family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub domain: String,
    pub family: AddressFamily,
    pub outcome: PairOutcome,
}

/// A family skipped because its address could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub family: AddressFamily,
    pub mode: AddressMode,
    pub reason: String,
}

/// Everything that happened during one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Processed pairs in processing order
    pub pairs: Vec<PairReport>,
    /// Families whose address retrieval failed
    pub source_failures: Vec<SourceFailure>,
}

impl CycleReport {
    /// Outcome recorded for `domain` and `family`, if it was processed
    pub fn outcome(&self, domain: &str, family: AddressFamily) -> Option<&PairOutcome> {
        self.pairs
            .iter()
            .find(|pair| pair.domain == domain && pair.family == family)
            .map(|pair| &pair.outcome)
    }

    /// Number of failed pairs and failed address retrievals
    pub fn failure_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|pair| pair.outcome.is_failure())
            .count()
            + self.source_failures.len()
    }

    fn push(&mut self, domain: &str, family: AddressFamily, outcome: PairOutcome) {
        self.pairs.push(PairReport {
            domain: domain.to_string(),
            family,
            outcome,
        });
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::new()`]
/// 2. Run single cycles with [`ReconcileEngine::run_cycle()`], or loop with
///    [`ReconcileEngine::run()`] / [`ReconcileEngine::run_until()`]
///
/// ## Threading
///
/// Every remote call is awaited before the next one starts; one domain and
/// one family are processed to completion before the next begins.
pub struct ReconcileEngine {
    /// Registrar holding the records
    registrar: Box<dyn Registrar>,

    /// Router source (WAN address and IPv6 prefix)
    router: Box<dyn AddressSource>,

    /// Host address source
    host: Box<dyn AddressSource>,

    /// Domains in processing order
    domains: Vec<String>,

    /// IPv4 tracking mode
    ipv4: AddressMode,

    /// IPv6 tracking mode
    ipv6: AddressMode,

    /// Attempts, interval and invalid-domain policy
    settings: EngineConfig,
}

impl ReconcileEngine {
    /// Create a new reconciliation engine
    ///
    /// # Parameters
    ///
    /// - `registrar`: Registrar implementation
    /// - `router`: Source for `fritzbox-wan` and `fritzbox-prefix-only` modes
    /// - `host`: Source for `host-ip` mode
    /// - `config`: DDNS configuration (validated here)
    pub fn new(
        registrar: Box<dyn Registrar>,
        router: Box<dyn AddressSource>,
        host: Box<dyn AddressSource>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            registrar,
            router,
            host,
            domains: config.domains,
            ipv4: config.ipv4,
            ipv6: config.ipv6,
            settings: config.engine,
        })
    }

    /// Run reconciliation cycles until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run reconciliation cycles until `shutdown` resolves
    ///
    /// A cycle in progress always runs to completion; the shutdown signal
    /// is observed while sleeping between cycles.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Engine started: {} domain(s), IPv4 mode {}, IPv6 mode {}",
            self.domains.len(),
            self.ipv4,
            self.ipv6
        );

        let interval = Duration::from_secs(self.settings.interval_secs);

        loop {
            let report = self.run_cycle().await;
            info!(
                "Cycle finished: {} pair(s) processed, {} failure(s)",
                report.pairs.len(),
                report.failure_count()
            );

            info!("Sleeping for {} seconds", self.settings.interval_secs);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one reconciliation cycle over all enabled families and domains
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for (family, mode) in [(AddressFamily::V4, self.ipv4), (AddressFamily::V6, self.ipv6)] {
            if mode == AddressMode::Disabled {
                debug!("{} updates are disabled, skipping", family);
                continue;
            }

            let target = match self.resolve_target(family, mode).await {
                Ok(target) => target,
                Err(e) => {
                    warn!("Retrieving current {} ({}) failed: {}", family, mode, e);
                    report.source_failures.push(SourceFailure {
                        family,
                        mode,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            debug!("{} target for this cycle: {:?}", family, target);
            self.reconcile_family(family, target, &mut report).await;
        }

        report
    }

    /// Fetch the address or prefix a family's records should follow
    async fn resolve_target(&self, family: AddressFamily, mode: AddressMode) -> Result<Target> {
        let address = match mode {
            AddressMode::Disabled => {
                return Err(Error::config(format!("{} updates are disabled", family)));
            }
            AddressMode::FritzboxPrefixOnly => {
                return Ok(Target::Prefix(self.router.current_prefix().await?));
            }
            AddressMode::FritzboxWan => self.router.current_address(family).await?,
            AddressMode::HostIp => self.host.current_address(family).await?,
        };

        if !family.matches(&address) {
            return Err(Error::address_source(format!(
                "expected an {} address, got {}",
                family, address
            )));
        }

        Ok(Target::Address(address))
    }

    /// Process every configured domain for one family
    async fn reconcile_family(
        &self,
        family: AddressFamily,
        target: Target,
        report: &mut CycleReport,
    ) {
        for (index, fqdn) in self.domains.iter().enumerate() {
            let name = match DomainName::parse(fqdn) {
                Ok(name) => name,
                Err(e) => {
                    report.push(fqdn, family, PairOutcome::InvalidDomain);
                    match self.settings.invalid_domain_policy {
                        InvalidDomainPolicy::HaltBatch => {
                            warn!(
                                "{}. Skipping the remaining {} domain(s) of this {} pass",
                                e,
                                self.domains.len() - index - 1,
                                family
                            );
                            return;
                        }
                        InvalidDomainPolicy::SkipDomain => {
                            warn!("{}. Skipping it", e);
                            continue;
                        }
                    }
                }
            };

            let outcome = self.reconcile_pair(&name, family, target).await;
            report.push(fqdn, family, outcome);
        }
    }

    /// List, decide and act for one domain and family
    async fn reconcile_pair(
        &self,
        name: &DomainName,
        family: AddressFamily,
        target: Target,
    ) -> PairOutcome {
        let record_type = family.record_type();

        let decision = match self.registrar.list_active(name, record_type).await {
            Ok(records) => {
                debug!(
                    "Found {} active {}-Record(s) for {}",
                    records.len(),
                    record_type,
                    name
                );
                match target {
                    Target::Address(address) => Decision::for_address(address, &records),
                    Target::Prefix(prefix) => match Decision::for_prefix(prefix, &records) {
                        Ok(decision) => decision,
                        Err(e) => {
                            warn!(
                                "Cannot combine prefix {} with the {}-Record of {}: {}",
                                prefix, record_type, name, e
                            );
                            return PairOutcome::AddressComputeFailed {
                                reason: e.to_string(),
                            };
                        }
                    },
                }
            }
            Err(e) => Decision::RetrievalFailed(Error::retrieval(e.to_string()).to_string()),
        };

        self.apply(name, record_type, decision).await
    }

    /// Carry out a decision
    async fn apply(
        &self,
        name: &DomainName,
        record_type: RecordType,
        decision: Decision,
    ) -> PairOutcome {
        match decision {
            Decision::Create { address } => {
                let registrar = self.registrar.as_ref();
                let created = self
                    .mutate("create", self.settings.create_attempts, name, record_type, move || {
                        registrar.create(name, record_type, address)
                    })
                    .await;

                match created {
                    Ok(_) => {
                        info!("{}-Record for {} created. New IP: {}", record_type, name, address);
                        PairOutcome::Created { address }
                    }
                    Err(e) => {
                        warn!("Could not create {}-Record for {}: {}", record_type, name, e);
                        PairOutcome::MutationFailed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            Decision::Edit {
                id,
                previous,
                address,
            } => {
                let registrar = self.registrar.as_ref();
                let record_id = id.as_str();
                let edited = self
                    .mutate("edit", self.settings.edit_attempts, name, record_type, move || {
                        registrar.edit(record_id, name, record_type, address)
                    })
                    .await;

                match edited {
                    Ok(attempts) => {
                        info!(
                            "{}-Record of {} updated: {} -> {}",
                            record_type, name, previous, address
                        );
                        PairOutcome::Edited {
                            previous,
                            address,
                            attempts,
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Could not update {}-Record of {} (still {}): {}",
                            record_type, name, previous, e
                        );
                        PairOutcome::MutationFailed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            Decision::UpToDate { address } => {
                info!("{}-Record of {} is up to date ({})", record_type, name, address);
                PairOutcome::UpToDate { address }
            }
            Decision::AmbiguousMultiple(count) => {
                warn!(
                    "Multiple active {}-Records ({}) found for {}. Remove the duplicates at the registrar; none of them will be changed until then",
                    record_type, count, name
                );
                PairOutcome::Ambiguous { count }
            }
            Decision::MissingReference => {
                warn!(
                    "No {}-Record found for {}. Prefix-only tracking can only edit an existing record",
                    record_type, name
                );
                PairOutcome::MissingReference
            }
            Decision::RetrievalFailed(reason) => {
                warn!(
                    "Skipping {}-Record update of {}: {}",
                    record_type, name, reason
                );
                PairOutcome::RetrievalFailed { reason }
            }
        }
    }

    /// Run a registrar mutation with bounded retries
    ///
    /// Returns the number of attempts used, or [`Error::Mutation`] carrying
    /// the last failure.
    async fn mutate<F, Fut>(
        &self,
        operation: &'static str,
        max_attempts: usize,
        name: &DomainName,
        record_type: RecordType,
        mut op: F,
    ) -> Result<usize>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let outcome = retry(max_attempts, |attempt| {
            let call = op();
            async move {
                let result = call.await;
                if let Err(ref e) = result {
                    warn!(
                        "{} attempt {}/{} for {}-Record of {} failed: {}",
                        operation, attempt, max_attempts, record_type, name, e
                    );
                }
                result
            }
        })
        .await;

        match outcome {
            Ok(Succeeded { attempts, .. }) => Ok(attempts),
            Err(Exhausted {
                last_error,
                attempts,
            }) => Err(Error::mutation(operation, attempts, last_error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classification() {
        assert!(PairOutcome::InvalidDomain.is_failure());
        assert!(
            PairOutcome::RetrievalFailed {
                reason: "timeout".to_string()
            }
            .is_failure()
        );
        assert!(!PairOutcome::Ambiguous { count: 2 }.is_failure());
        assert!(!PairOutcome::MissingReference.is_failure());
    }

    #[test]
    fn report_lookup_and_failure_count() {
        let mut report = CycleReport::default();
        report.push("a.example.com", AddressFamily::V4, PairOutcome::InvalidDomain);
        report.push(
            "b.example.com",
            AddressFamily::V6,
            PairOutcome::UpToDate {
                address: "2001:db8::1".parse().unwrap(),
            },
        );
        report.source_failures.push(SourceFailure {
            family: AddressFamily::V4,
            mode: AddressMode::FritzboxWan,
            reason: "unreachable".to_string(),
        });

        assert_eq!(
            report.outcome("a.example.com", AddressFamily::V4),
            Some(&PairOutcome::InvalidDomain)
        );
        assert_eq!(report.outcome("a.example.com", AddressFamily::V6), None);
        assert_eq!(report.failure_count(), 2);
    }
}
