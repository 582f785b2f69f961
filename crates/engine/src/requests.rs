//! Typed request structs, one per engine operation.
//!
//! Requests are validated at this boundary before any domain code runs;
//! nothing loosely-typed reaches the engine. Creating operations carry an
//! explicit `occurred_at` so callers (and tests) control business time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{Currency, ExpenseId, GroupId, MemberId, Money, SettlementId};
use splitledger_ledger::{ExpenseCategory, SettlementMethod};

/// Create a group. The creator becomes the sole admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub description: String,
    pub currency: Currency,
    pub creator: MemberId,
    pub founding_members: Vec<MemberId>,
    pub occurred_at: DateTime<Utc>,
}

/// Record a shared expense paid by `payer`, split per `splits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordExpense {
    pub group_id: GroupId,
    /// Acting member (resolved by the identity collaborator upstream).
    pub actor: MemberId,
    pub payer: MemberId,
    pub total_amount: Money,
    /// Per-member shares, already resolved to Money amounts.
    pub splits: BTreeMap<MemberId, Money>,
    pub description: String,
    pub category: ExpenseCategory,
    pub receipt: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Replace an expense's amount/splits/metadata atomically, re-validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendExpense {
    pub expense_id: ExpenseId,
    pub actor: MemberId,
    pub new_total_amount: Money,
    pub new_splits: BTreeMap<MemberId, Money>,
    pub new_description: String,
    pub new_category: ExpenseCategory,
    pub new_receipt: Option<String>,
}

/// Delete an expense, undoing its exact ledger contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseExpense {
    pub expense_id: ExpenseId,
    pub actor: MemberId,
}

/// Record an out-of-band payment from `from` to `to` (pending until
/// completed; no balance effect yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSettlement {
    pub group_id: GroupId,
    pub actor: MemberId,
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
    pub method: SettlementMethod,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

/// Mark a settlement completed, applying it to the balances. Idempotent:
/// completing an already-completed settlement is a no-op success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSettlement {
    pub settlement_id: SettlementId,
}

/// Add a member (admin only). A former member rejoins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMember {
    pub group_id: GroupId,
    pub actor: MemberId,
    pub new_member: MemberId,
    pub occurred_at: DateTime<Utc>,
}

/// Remove a member (admin only; the last admin cannot be removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveMember {
    pub group_id: GroupId,
    pub actor: MemberId,
    pub member: MemberId,
}

/// Update group settings (admin only). `None` keeps the existing value;
/// a currency change is rejected once ledger activity exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGroupSettings {
    pub group_id: GroupId,
    pub actor: MemberId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub currency: Option<Currency>,
}
