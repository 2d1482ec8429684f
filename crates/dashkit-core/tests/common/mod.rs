//! Test doubles and common utilities for reconciliation contract tests

#![allow(dead_code)]

use dashkit_core::config::{RecordConfig, RecordKey, RecordType, ReconcileConfig};
use dashkit_core::error::{Error, Result};
use dashkit_core::provider::MemoryRecordProvider;
use dashkit_core::traits::RecordProvider;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A provider backed by memory that fails a configurable number of mutating
/// calls before letting them through
pub struct FlakyProvider {
    /// Real storage
    inner: MemoryRecordProvider,
    /// Mutating calls left to fail
    failures_left: Arc<AtomicUsize>,
    /// Mutating calls made, including failed ones
    mutation_calls: Arc<AtomicUsize>,
    /// Record names the provider refuses
    unsupported: Vec<String>,
}

impl FlakyProvider {
    pub fn new(inner: MemoryRecordProvider, failures: usize) -> Self {
        Self {
            inner,
            failures_left: Arc::new(AtomicUsize::new(failures)),
            mutation_calls: Arc::new(AtomicUsize::new(0)),
            unsupported: Vec::new(),
        }
    }

    /// A provider that never fails
    pub fn reliable(inner: MemoryRecordProvider) -> Self {
        Self::new(inner, 0)
    }

    /// A provider whose mutations always fail
    pub fn broken(inner: MemoryRecordProvider) -> Self {
        Self::new(inner, usize::MAX)
    }

    /// Refuse to manage the given record name
    pub fn refusing(mut self, name: &str) -> Self {
        self.unsupported.push(name.to_string());
        self
    }

    /// Number of mutating calls made so far
    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    /// Create a new FlakyProvider that shares storage and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            failures_left: Arc::clone(&other.failures_left),
            mutation_calls: Arc::clone(&other.mutation_calls),
            unsupported: other.unsupported.clone(),
        }
    }

    fn gate(&self) -> Result<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        if left != usize::MAX {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
        }
        Err(Error::Other("Provider unavailable".to_string()))
    }
}

#[async_trait::async_trait]
impl RecordProvider for FlakyProvider {
    async fn list_values(&self, record: &RecordKey) -> Result<Vec<String>> {
        self.inner.list_values(record).await
    }

    async fn create_value(&self, record: &RecordKey, value: &str) -> Result<()> {
        self.gate()?;
        self.inner.create_value(record, value).await
    }

    async fn replace_value(&self, record: &RecordKey, from: &str, to: &str) -> Result<()> {
        self.gate()?;
        self.inner.replace_value(record, from, to).await
    }

    async fn delete_value(&self, record: &RecordKey, value: &str) -> Result<()> {
        self.gate()?;
        self.inner.delete_value(record, value).await
    }

    fn supports_record(&self, record: &RecordKey) -> bool {
        !self.unsupported.contains(&record.name)
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

/// Nameserver record key for example.com
pub fn ns_key() -> RecordKey {
    RecordKey::new("example.com", RecordType::Ns)
}

/// A record config targeting the WordPress.com nameservers
pub fn wpcom_nameservers() -> RecordConfig {
    RecordConfig::new("example.com", RecordType::Ns).with_target([
        "ns1.wordpress.com",
        "ns2.wordpress.com",
        "ns3.wordpress.com",
    ])
}

/// Helper to create a config with no retry delay
pub fn fast_config(records: Vec<RecordConfig>, max_retries: usize) -> ReconcileConfig {
    let mut config = ReconcileConfig::new();
    config.records = records;
    config.engine.max_retries = max_retries;
    config.engine.retry_delay_ms = 0;
    config.engine.event_channel_capacity = 100;
    config
}
