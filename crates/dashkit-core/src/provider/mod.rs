// # Record Provider Implementations
//
// Built-in implementations of the RecordProvider trait.

pub mod memory;

pub use memory::{AppliedChange, MemoryRecordProvider, MemoryRecordProviderFactory};
