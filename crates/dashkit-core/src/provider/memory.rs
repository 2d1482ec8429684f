// # Memory Record Provider
//
// In-memory implementation of RecordProvider.
//
// ## Purpose
//
// Holds record sets in a HashMap so plans can be applied without talking to
// a real DNS host. Used by tests, dry runs and the CLI, which seeds it from
// the `memory` provider configuration.
//
// ## Behavior
//
// - Value order is preserved; replacements keep the position of the value
//   they replace, creations append.
// - Every successful change is appended to a history log with a timestamp.
// - Nothing persists across restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{ProviderConfig, RecordKey, RecordSeed};
use crate::reconcile::RecordChange;
use crate::traits::{RecordProvider, RecordProviderFactory};
use crate::Error;

/// A change applied to the memory provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// The record set that changed
    pub record: RecordKey,
    /// What changed
    pub change: RecordChange,
    /// When it was applied
    pub applied_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<RecordKey, Vec<String>>,
    history: Vec<AppliedChange>,
}

/// In-memory record provider implementation
///
/// # Example
///
/// ```rust,no_run
/// use dashkit_core::provider::MemoryRecordProvider;
/// use dashkit_core::traits::RecordProvider;
/// use dashkit_core::{RecordKey, RecordType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryRecordProvider::new();
///     let key = RecordKey::new("example.com", RecordType::A);
///
///     provider.create_value(&key, "192.0.78.24").await?;
///     assert_eq!(provider.list_values(&key).await?, vec!["192.0.78.24"]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordProvider {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryRecordProvider {
    /// Create a new empty memory provider
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Create a provider pre-populated with record values
    pub fn with_seed(seed: &[RecordSeed]) -> Self {
        let mut inner = Inner::default();
        for entry in seed {
            inner
                .records
                .entry(entry.key())
                .or_default()
                .extend(entry.values.iter().cloned());
        }

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Overwrite the values of one record set
    pub async fn set_values<I, S>(&self, record: &RecordKey, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = self.inner.write().await;
        guard
            .records
            .insert(record.clone(), values.into_iter().map(Into::into).collect());
    }

    /// Get the number of record sets in the provider
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Check if the provider holds no record sets
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// Changes applied so far, oldest first
    pub async fn history(&self) -> Vec<AppliedChange> {
        self.inner.read().await.history.clone()
    }

    fn log(inner: &mut Inner, record: &RecordKey, change: RecordChange) {
        inner.history.push(AppliedChange {
            record: record.clone(),
            change,
            applied_at: chrono::Utc::now(),
        });
    }
}

impl Default for MemoryRecordProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordProvider for MemoryRecordProvider {
    async fn list_values(&self, record: &RecordKey) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.records.get(record).cloned().unwrap_or_default())
    }

    async fn create_value(&self, record: &RecordKey, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let values = guard.records.entry(record.clone()).or_default();
        if values.iter().any(|existing| existing == value) {
            return Err(Error::conflict(format!("{} already has value '{}'", record, value)));
        }
        values.push(value.to_string());
        Self::log(&mut guard, record, RecordChange::Add(value.to_string()));
        Ok(())
    }

    async fn replace_value(&self, record: &RecordKey, from: &str, to: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let slot = guard
            .records
            .get_mut(record)
            .and_then(|values| values.iter_mut().find(|value| value.as_str() == from))
            .ok_or_else(|| Error::not_found(format!("{} has no value '{}'", record, from)))?;
        *slot = to.to_string();
        Self::log(
            &mut guard,
            record,
            RecordChange::Replace {
                from: from.to_string(),
                to: to.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_value(&self, record: &RecordKey, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let values = guard
            .records
            .get_mut(record)
            .ok_or_else(|| Error::not_found(format!("{} does not exist", record)))?;
        let position = values
            .iter()
            .position(|existing| existing == value)
            .ok_or_else(|| Error::not_found(format!("{} has no value '{}'", record, value)))?;
        values.remove(position);
        if values.is_empty() {
            guard.records.remove(record);
        }
        Self::log(&mut guard, record, RecordChange::Remove(value.to_string()));
        Ok(())
    }

    fn supports_record(&self, _record: &RecordKey) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for memory record providers
pub struct MemoryRecordProviderFactory;

impl RecordProviderFactory for MemoryRecordProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RecordProvider>, Error> {
        match config {
            ProviderConfig::Memory { seed } => Ok(Box::new(MemoryRecordProvider::with_seed(seed))),
            other => Err(Error::config(format!(
                "Memory provider factory cannot build a '{}' provider",
                other.type_name()
            ))),
        }
    }
}
