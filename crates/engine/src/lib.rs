//! `splitledger-engine` — the call-level contract over the shared-expense
//! ledger.
//!
//! Callers (an HTTP layer, a CLI, tests) map their transport onto the typed
//! request structs here; the engine runs guard -> validation -> ledger
//! mutation and hands back typed results. It owns the derived balance state
//! and the per-group write serialization; it does not own durable storage —
//! a [`splitledger_infra::LedgerStore`] is passed in at construction.

pub mod engine;
pub mod error;
pub mod requests;

pub use engine::LedgerEngine;
pub use error::{EngineError, EngineResult};
pub use requests::{
    AddMember, AmendExpense, CompleteSettlement, CreateGroup, RecordExpense, RecordSettlement,
    RemoveMember, ReverseExpense, UpdateGroupSettings,
};
