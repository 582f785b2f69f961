use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use splitledger_core::{MemberId, Money};

use crate::GroupBalances;

/// A suggested transfer. Not persisted; a recommendation derived from the
/// current ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Reduce the pairwise debt graph to a minimal set of transfers.
///
/// Pure function of the current ledger state; never mutates. Collapses the
/// graph into one net position per member, then greedily matches the
/// largest-magnitude debtor against the largest-magnitude creditor until
/// every position is zero; the conservation invariant guarantees an exact
/// zero residual. Equal magnitudes break ties by ascending `MemberId`, so
/// identical input always yields identical output, same order included.
///
/// At most `n - 1` transfers are produced for `n` members with a non-zero
/// net position: every match zeroes at least one of the two members.
pub fn simplify(balances: &GroupBalances) -> Vec<Transfer> {
    let currency = balances.currency().clone();

    // Max-heaps keyed by (magnitude, smallest-id-first tie break).
    let mut debtors: BinaryHeap<(i64, Reverse<MemberId>)> = BinaryHeap::new();
    let mut creditors: BinaryHeap<(i64, Reverse<MemberId>)> = BinaryHeap::new();
    for (member, net) in balances.net_positions_minor() {
        match net.cmp(&0) {
            core::cmp::Ordering::Greater => creditors.push((net, Reverse(member))),
            core::cmp::Ordering::Less => debtors.push((-net, Reverse(member))),
            core::cmp::Ordering::Equal => {}
        }
    }

    let mut transfers = Vec::new();
    // Positions sum to zero, so the heaps drain together.
    loop {
        let Some(&(owed, Reverse(debtor))) = debtors.peek() else { break };
        let Some(&(due, Reverse(creditor))) = creditors.peek() else { break };
        debtors.pop();
        creditors.pop();

        let amount = owed.min(due);
        transfers.push(Transfer {
            from: debtor,
            to: creditor,
            amount: Money::new(amount, currency.clone()),
        });

        if owed > amount {
            debtors.push((owed - amount, Reverse(debtor)));
        }
        if due > amount {
            creditors.push((due - amount, Reverse(creditor)));
        }
    }
    transfers
}
