//! Engine error taxonomy.

use thiserror::Error;

use splitledger_auth::AuthError;
use splitledger_core::{ExpenseId, GroupId, MoneyError, SettlementId};
use splitledger_groups::GroupError;
use splitledger_ledger::SplitError;

/// Result type used across the engine boundary.
pub type EngineResult<T> = Result<T, EngineError>;

/// Per-call failure of an engine operation.
///
/// Every failure is a typed value; nothing here is fatal to the process and
/// no error is retried internally; the engine is deterministic and
/// synchronous, so retry policy belongs to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Expense shape failed validation (user-correctable).
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Membership/role violation, surfaced distinctly from validation so
    /// clients can tell "fix your input" apart from "you can't do this".
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Currency mismatch or arithmetic overflow.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Structural membership violation raised by the group itself.
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Request-shape violation not covered by a more specific error.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    #[error("settlement {0} not found")]
    SettlementNotFound(SettlementId),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
