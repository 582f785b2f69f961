use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{ExpenseId, GroupId, MemberId, Money};

/// Expense category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Accommodation,
    Entertainment,
    Shopping,
    Utilities,
    Other,
}

impl Default for ExpenseCategory {
    fn default() -> Self {
        ExpenseCategory::Other
    }
}

/// A recorded shared expense.
///
/// Immutable once recorded; the engine replaces the whole record on
/// amendment and removes it on reversal. `sum(splits) == total_amount`
/// exactly; validated before the record is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: ExpenseId,
    pub group_id: GroupId,
    pub payer: MemberId,
    pub total_amount: Money,
    /// Per-member shares in ascending `MemberId` order.
    pub splits: BTreeMap<MemberId, Money>,
    pub description: String,
    pub category: ExpenseCategory,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
}
