//! `splitledger-auth` — pure authorization boundary for group mutations.
//!
//! This crate is intentionally decoupled from HTTP and storage. Callers are
//! assumed already authenticated; what is decided here is whether a known
//! member may perform a given action on a given group.

pub mod action;
pub mod authorize;

pub use action::GroupAction;
pub use authorize::{AuthError, authorize};
