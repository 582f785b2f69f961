//! Storage abstractions consumed by the engine.
//!
//! CRUD only, no business logic: the engine is the only legitimate writer of
//! balance-affecting effects, and it receives one of these providers as an
//! explicit value (never a process-wide singleton).

pub mod store;

pub use store::{InMemoryLedgerStore, LedgerStore};
