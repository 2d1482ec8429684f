//! Core traits for dashkit
//!
//! - [`RecordProvider`]: Read and change record values at a DNS host

pub mod record_provider;

pub use record_provider::{RecordProvider, RecordProviderFactory};
