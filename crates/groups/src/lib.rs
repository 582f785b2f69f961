//! Groups domain module (membership, roles, group settings).
//!
//! This crate contains business rules for expense-sharing groups,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod group;

pub use group::{Group, GroupError, GroupMember, MemberRole};
