use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{GroupId, MemberId, Money, SettlementId};

/// How a settlement was paid out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    Cash,
    Venmo,
    Paypal,
    BankTransfer,
    Other,
}

impl Default for SettlementMethod {
    fn default() -> Self {
        SettlementMethod::Cash
    }
}

/// Settlement status lifecycle. One-way: pending -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
}

/// An out-of-band payment from one member to another.
///
/// Recording a settlement has no balance effect; balances change when the
/// settlement is completed. Once completed, the record is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: SettlementId,
    pub group_id: GroupId,
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
    pub method: SettlementMethod,
    pub notes: String,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn is_completed(&self) -> bool {
        self.status == SettlementStatus::Completed
    }

    pub fn complete(&mut self) {
        self.status = SettlementStatus::Completed;
    }
}
