// # dashkit-core
//
// Record matching and reconciliation for dashkit.
//
// ## Architecture Overview
//
// - **match_records**: Pairs current record values with target values
// - **ChangePlan**: The matches of one record set as concrete edits
// - **RecordProvider**: Trait for reading and editing record values at a host
// - **Reconciler**: Applies change plans through a provider, with retries
// - **ProviderRegistry**: Plugin-based registry for record providers
//
// ## Design Principles
//
// 1. **Pure core**: Matching is a total function with no I/O
// 2. **Separation of Concerns**: Deciding changes is separate from applying them
// 3. **Plugin-Based**: Providers are registered by name, no hard-coded if-else
// 4. **Library-First**: The CLI is a thin layer over this crate

pub mod config;
pub mod error;
pub mod matcher;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, ProviderConfig, RecordConfig, RecordKey, RecordType, ReconcileConfig};
pub use error::{Error, Result};
pub use matcher::{match_records, Pairing, SENTINEL};
pub use provider::MemoryRecordProvider;
pub use reconcile::{ChangePlan, ReconcileEvent, ReconcileReport, Reconciler, RecordChange};
pub use registry::ProviderRegistry;
pub use traits::{RecordProvider, RecordProviderFactory};
