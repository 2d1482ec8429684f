// # Record Provider Trait
//
// Defines the interface for reading and changing the values of a record set
// at a DNS host.
//
// ## Implementations
//
// - In-memory: `MemoryRecordProvider` (tests, dry runs, the CLI)
// - Hosted DNS APIs: outside this crate, registered through `ProviderRegistry`
//
// ## Usage
//
// ```rust,ignore
// use dashkit_core::{RecordKey, RecordProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* RecordProvider implementation */;
//     let key = RecordKey::new("example.com", RecordType::Ns);
//
//     let current = provider.list_values(&key).await?;
//     provider.replace_value(&key, "ns1.other.com", "ns1.wordpress.com").await?;
//
//     Ok(())
// }
// ```

use crate::config::RecordKey;
use async_trait::async_trait;

/// Trait for record provider implementations
///
/// A provider exposes the values of a record set as an ordered list of
/// strings and applies single-value changes to it. Deciding *which* changes
/// to make is the reconciler's job.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Retries
///
/// Providers execute one change per call and return an error on failure.
/// They must not retry, back off or sleep; the `Reconciler` owns the retry
/// policy.
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// List the values currently configured on a record set
    ///
    /// A record set that does not exist yields an empty list rather than an
    /// error.
    async fn list_values(&self, record: &RecordKey) -> Result<Vec<String>, crate::Error>;

    /// Add a value to a record set, creating the set if needed
    ///
    /// Returns [`crate::Error::Conflict`] if the value is already present.
    async fn create_value(&self, record: &RecordKey, value: &str) -> Result<(), crate::Error>;

    /// Swap one existing value for another, keeping its position
    ///
    /// Returns [`crate::Error::NotFound`] if `from` is not on the record.
    async fn replace_value(
        &self,
        record: &RecordKey,
        from: &str,
        to: &str,
    ) -> Result<(), crate::Error>;

    /// Remove one occurrence of a value from a record set
    ///
    /// Returns [`crate::Error::NotFound`] if the value is not on the record.
    async fn delete_value(&self, record: &RecordKey, value: &str) -> Result<(), crate::Error>;

    /// Check if this provider can manage the given record
    fn supports_record(&self, record: &RecordKey) -> bool;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing record providers from configuration
pub trait RecordProviderFactory: Send + Sync {
    /// Create a RecordProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn RecordProvider>, crate::Error>;
}
