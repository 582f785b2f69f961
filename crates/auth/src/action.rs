use serde::{Deserialize, Serialize};

use splitledger_core::MemberId;

/// A group mutation to be authorized before it reaches the ledger.
///
/// Balance-affecting actions carry every member they reference so the
/// membership-consistency rule can be checked in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupAction {
    AddMember {
        new_member: MemberId,
    },
    RemoveMember {
        member: MemberId,
    },
    UpdateGroupSettings,
    RecordExpense {
        payer: MemberId,
        participants: Vec<MemberId>,
    },
    AmendExpense {
        payer: MemberId,
        participants: Vec<MemberId>,
    },
    ReverseExpense,
    RecordSettlement {
        from: MemberId,
        to: MemberId,
    },
}
