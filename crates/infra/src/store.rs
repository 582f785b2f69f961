use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use splitledger_core::{ExpenseId, GroupId, SettlementId};
use splitledger_groups::Group;
use splitledger_ledger::{Expense, Settlement};

/// Storage provider consumed by the engine: load/save for groups, expenses
/// and settlements by id. CRUD only; business rules live upstream.
pub trait LedgerStore: Send + Sync {
    fn get_group(&self, id: GroupId) -> Option<Group>;
    fn upsert_group(&self, group: Group);

    fn get_expense(&self, id: ExpenseId) -> Option<Expense>;
    fn upsert_expense(&self, expense: Expense);
    fn remove_expense(&self, id: ExpenseId) -> Option<Expense>;
    fn list_expenses(&self, group_id: GroupId) -> Vec<Expense>;

    fn get_settlement(&self, id: SettlementId) -> Option<Settlement>;
    fn upsert_settlement(&self, settlement: Settlement);
    fn list_settlements(&self, group_id: GroupId) -> Vec<Settlement>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn get_group(&self, id: GroupId) -> Option<Group> {
        (**self).get_group(id)
    }

    fn upsert_group(&self, group: Group) {
        (**self).upsert_group(group)
    }

    fn get_expense(&self, id: ExpenseId) -> Option<Expense> {
        (**self).get_expense(id)
    }

    fn upsert_expense(&self, expense: Expense) {
        (**self).upsert_expense(expense)
    }

    fn remove_expense(&self, id: ExpenseId) -> Option<Expense> {
        (**self).remove_expense(id)
    }

    fn list_expenses(&self, group_id: GroupId) -> Vec<Expense> {
        (**self).list_expenses(group_id)
    }

    fn get_settlement(&self, id: SettlementId) -> Option<Settlement> {
        (**self).get_settlement(id)
    }

    fn upsert_settlement(&self, settlement: Settlement) {
        (**self).upsert_settlement(settlement)
    }

    fn list_settlements(&self, group_id: GroupId) -> Vec<Settlement> {
        (**self).list_settlements(group_id)
    }
}

/// In-memory store for tests/dev and as the reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    groups: RwLock<HashMap<GroupId, Group>>,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
    settlements: RwLock<HashMap<SettlementId, Settlement>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_group(&self, id: GroupId) -> Option<Group> {
        let map = self.groups.read().ok()?;
        map.get(&id).cloned()
    }

    fn upsert_group(&self, group: Group) {
        if let Ok(mut map) = self.groups.write() {
            map.insert(group.id(), group);
        }
    }

    fn get_expense(&self, id: ExpenseId) -> Option<Expense> {
        let map = self.expenses.read().ok()?;
        map.get(&id).cloned()
    }

    fn upsert_expense(&self, expense: Expense) {
        if let Ok(mut map) = self.expenses.write() {
            map.insert(expense.expense_id, expense);
        }
    }

    fn remove_expense(&self, id: ExpenseId) -> Option<Expense> {
        let mut map = self.expenses.write().ok()?;
        map.remove(&id)
    }

    fn list_expenses(&self, group_id: GroupId) -> Vec<Expense> {
        let map = match self.expenses.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect()
    }

    fn get_settlement(&self, id: SettlementId) -> Option<Settlement> {
        let map = self.settlements.read().ok()?;
        map.get(&id).cloned()
    }

    fn upsert_settlement(&self, settlement: Settlement) {
        if let Ok(mut map) = self.settlements.write() {
            map.insert(settlement.settlement_id, settlement);
        }
    }

    fn list_settlements(&self, group_id: GroupId) -> Vec<Settlement> {
        let map = match self.settlements.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect()
    }
}
