//! Test doubles and common utilities for engine contract tests
//!
//! The doubles keep their observable state behind `Arc`s so a test can hand
//! one copy to the engine and keep another for assertions
//! (see `sharing_counters_with`).

#![allow(dead_code)]

use ddns_core::config::{AddressMode, DdnsConfig, EngineConfig, RegistrarConfig};
use ddns_core::domain::DomainName;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{ActiveRecord, AddressFamily, AddressSource, RecordType, Registrar};
use ddns_core::ReconcileEngine;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type RecordKey = (String, RecordType);

/// An in-memory registrar with scriptable failures
pub struct ScriptedRegistrar {
    /// Active records per (fqdn, type)
    records: Arc<Mutex<HashMap<RecordKey, Vec<ActiveRecord>>>>,
    /// Domains whose listing fails
    failing_lists: Arc<Mutex<HashSet<String>>>,
    /// Edits that fail before edits start succeeding
    edit_failures: Arc<AtomicUsize>,
    /// Creates that fail before creates start succeeding
    create_failures: Arc<AtomicUsize>,
    /// Domains passed to list_active(), in call order
    list_calls: Arc<Mutex<Vec<String>>>,
    /// (fqdn, address) passed to create(), in call order
    create_calls: Arc<Mutex<Vec<(String, IpAddr)>>>,
    /// (record id, fqdn, address) passed to edit(), in call order
    edit_calls: Arc<Mutex<Vec<(String, String, IpAddr)>>>,
    /// Source of IDs for created records
    next_id: Arc<AtomicUsize>,
}

impl ScriptedRegistrar {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            failing_lists: Arc::new(Mutex::new(HashSet::new())),
            edit_failures: Arc::new(AtomicUsize::new(0)),
            create_failures: Arc::new(AtomicUsize::new(0)),
            list_calls: Arc::new(Mutex::new(Vec::new())),
            create_calls: Arc::new(Mutex::new(Vec::new())),
            edit_calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(1000)),
        }
    }

    /// Add an active record
    pub fn with_record(self, fqdn: &str, record_type: RecordType, id: &str, content: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry((fqdn.to_string(), record_type))
            .or_default()
            .push(ActiveRecord::new(id, content));
        self
    }

    /// Make every listing for `fqdn` fail
    pub fn with_failing_list(self, fqdn: &str) -> Self {
        self.failing_lists.lock().unwrap().insert(fqdn.to_string());
        self
    }

    /// Make the next `count` edits fail
    pub fn with_edit_failures(self, count: usize) -> Self {
        self.edit_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Make the next `count` creates fail
    pub fn with_create_failures(self, count: usize) -> Self {
        self.create_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Create a new ScriptedRegistrar that shares all state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            failing_lists: Arc::clone(&other.failing_lists),
            edit_failures: Arc::clone(&other.edit_failures),
            create_failures: Arc::clone(&other.create_failures),
            list_calls: Arc::clone(&other.list_calls),
            create_calls: Arc::clone(&other.create_calls),
            edit_calls: Arc::clone(&other.edit_calls),
            next_id: Arc::clone(&other.next_id),
        }
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<(String, IpAddr)> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn edit_calls(&self) -> Vec<(String, String, IpAddr)> {
        self.edit_calls.lock().unwrap().clone()
    }

    /// Current records for (fqdn, type)
    pub fn records(&self, fqdn: &str, record_type: RecordType) -> Vec<ActiveRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(fqdn.to_string(), record_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Consume one scripted failure, if any are left
    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl Registrar for ScriptedRegistrar {
    async fn list_active(
        &self,
        name: &DomainName,
        record_type: RecordType,
    ) -> Result<Vec<ActiveRecord>> {
        self.list_calls.lock().unwrap().push(name.fqdn().to_string());

        if self.failing_lists.lock().unwrap().contains(name.fqdn()) {
            return Err(Error::http("connection refused"));
        }

        Ok(self.records(name.fqdn(), record_type))
    }

    async fn create(&self, name: &DomainName, record_type: RecordType, address: IpAddr) -> Result<()> {
        self.create_calls
            .lock()
            .unwrap()
            .push((name.fqdn().to_string(), address));

        if Self::take_failure(&self.create_failures) {
            return Err(Error::registrar("scripted", "create rejected"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.records
            .lock()
            .unwrap()
            .entry((name.fqdn().to_string(), record_type))
            .or_default()
            .push(ActiveRecord::new(id, address.to_string()));
        Ok(())
    }

    async fn edit(
        &self,
        record_id: &str,
        name: &DomainName,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<()> {
        self.edit_calls.lock().unwrap().push((
            record_id.to_string(),
            name.fqdn().to_string(),
            address,
        ));

        if Self::take_failure(&self.edit_failures) {
            return Err(Error::http("connection reset"));
        }

        let mut records = self.records.lock().unwrap();
        let entry = records
            .entry((name.fqdn().to_string(), record_type))
            .or_default();
        match entry.iter_mut().find(|record| record.id == record_id) {
            Some(record) => {
                record.address = address.to_string();
                Ok(())
            }
            None => Err(Error::registrar("scripted", format!("no record {}", record_id))),
        }
    }

    fn registrar_name(&self) -> &'static str {
        "scripted"
    }
}

/// An address source returning fixed values
///
/// Unset values make the corresponding call fail.
pub struct FixedAddressSource {
    v4: Option<IpAddr>,
    v6: Option<IpAddr>,
    prefix: Option<Ipv6Addr>,
    /// Call counter for current_address() and current_prefix()
    call_count: Arc<AtomicUsize>,
}

impl FixedAddressSource {
    pub fn new() -> Self {
        Self {
            v4: None,
            v6: None,
            prefix: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_v4(mut self, addr: &str) -> Self {
        self.v4 = Some(addr.parse().unwrap());
        self
    }

    pub fn with_v6(mut self, addr: &str) -> Self {
        self.v6 = Some(addr.parse().unwrap());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.parse().unwrap());
        self
    }

    /// Get the number of address and prefix lookups
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new FixedAddressSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            v4: other.v4,
            v6: other.v6,
            prefix: other.prefix,
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl AddressSource for FixedAddressSource {
    async fn current_address(&self, family: AddressFamily) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let addr = match family {
            AddressFamily::V4 => self.v4,
            AddressFamily::V6 => self.v6,
        };
        addr.ok_or_else(|| Error::address_source(format!("no {} address", family)))
    }

    async fn current_prefix(&self) -> Result<Ipv6Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prefix
            .ok_or_else(|| Error::address_source("no IPv6 prefix"))
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// Helper to create a minimal DdnsConfig for testing (IPv4 from the router only)
pub fn minimal_config(domains: &[&str]) -> DdnsConfig {
    let mut config = DdnsConfig::new(
        domains.iter().map(|d| d.to_string()).collect(),
        RegistrarConfig::new("pk1_test", "sk1_test"),
    );
    config.ipv4 = AddressMode::FritzboxWan;
    config.ipv6 = AddressMode::Disabled;
    config.engine = EngineConfig::default();
    config
}

/// Build an engine whose collaborators share state with the given doubles
pub fn engine_for(
    registrar: &ScriptedRegistrar,
    router: &FixedAddressSource,
    host: &FixedAddressSource,
    config: DdnsConfig,
) -> ReconcileEngine {
    ReconcileEngine::new(
        Box::new(ScriptedRegistrar::sharing_counters_with(registrar)),
        Box::new(FixedAddressSource::sharing_counters_with(router)),
        Box::new(FixedAddressSource::sharing_counters_with(host)),
        config,
    )
    .expect("engine construction succeeds")
}

/// Collects formatted log lines emitted while its guard is alive
///
/// The guard sets a thread-local default subscriber, which covers the
/// current-thread runtime used by `#[tokio::test]`.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    /// Captured lines at WARN level
    pub fn warnings(&self) -> Vec<String> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter(|line| line.contains("WARN"))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
