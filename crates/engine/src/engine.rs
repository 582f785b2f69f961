use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use splitledger_auth::{GroupAction, authorize};
use splitledger_core::{ExpenseId, GroupId, MemberId, Money, MoneyError, SettlementId};
use splitledger_groups::Group;
use splitledger_infra::LedgerStore;
use splitledger_ledger::{
    Expense, GroupBalances, Settlement, SettlementStatus, Transfer, simplify, validate_splits,
};

use crate::error::{EngineError, EngineResult};
use crate::requests::{
    AddMember, AmendExpense, CompleteSettlement, CreateGroup, RecordExpense, RecordSettlement,
    RemoveMember, ReverseExpense, UpdateGroupSettings,
};

const POISONED: &str = "group balance lock poisoned";

/// The shared-expense ledger engine.
///
/// Owns the derived balance state per group and the locks that serialize
/// mutations to it. The storage provider is an explicit value passed in at
/// construction — the engine holds no process-wide mutable state beyond its
/// per-group cells.
///
/// Concurrency: every mutating operation takes the target group's write
/// lock for the duration of one ledger operation; reads take the read lock
/// and observe a consistent snapshot. The outer registry lock is held only
/// to fetch or insert a cell, so operations on different groups never block
/// each other.
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    balances: RwLock<HashMap<GroupId, Arc<RwLock<GroupBalances>>>>,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            balances: RwLock::new(HashMap::new()),
        }
    }

    // ── mutations ────────────────────────────────────────────────────────

    /// Create a group; the creator becomes the sole admin.
    pub fn create_group(&self, req: CreateGroup) -> EngineResult<Group> {
        let group = Group::create(
            GroupId::new(),
            req.name,
            req.description,
            req.currency,
            req.creator,
            &req.founding_members,
            req.occurred_at,
        )?;

        self.store.upsert_group(group.clone());
        self.balances.write().expect(POISONED).insert(
            group.id(),
            Arc::new(RwLock::new(GroupBalances::new(group.currency().clone()))),
        );

        info!(group_id = %group.id(), members = group.member_count(), "group created");
        Ok(group)
    }

    /// Record a shared expense and apply it to the balances.
    pub fn record_expense(&self, req: RecordExpense) -> EngineResult<Expense> {
        let cell = self.balance_cell(req.group_id)?;
        let mut ledger = cell.write().expect(POISONED);
        // Membership mutations hold this same lock, so the group read below
        // stays current for the whole critical section.
        let group = self.load_group(req.group_id)?;

        let action = GroupAction::RecordExpense {
            payer: req.payer,
            participants: req.splits.keys().copied().collect(),
        };
        self.guard(req.actor, &group, &action)?;
        ensure_group_currency(&group, &req.total_amount)?;
        validate_splits(&group, req.payer, &req.total_amount, &req.splits)?;

        let expense = Expense {
            expense_id: ExpenseId::new(),
            group_id: req.group_id,
            payer: req.payer,
            total_amount: req.total_amount,
            splits: req.splits,
            description: req.description,
            category: req.category,
            receipt: req.receipt,
            created_at: req.occurred_at,
        };

        ledger.apply_expense(&expense)?;
        self.store.upsert_expense(expense.clone());

        info!(
            expense_id = %expense.expense_id,
            group_id = %expense.group_id,
            total = %expense.total_amount,
            "expense recorded"
        );
        Ok(expense)
    }

    /// Replace an expense's amount/splits/metadata atomically.
    ///
    /// The old deltas are retracted and the new ones applied under one lock,
    /// so no reader ever sees the expense half-amended.
    pub fn amend_expense(&self, req: AmendExpense) -> EngineResult<Expense> {
        let current = self.find_expense(req.expense_id)?;
        let cell = self.balance_cell(current.group_id)?;
        let mut ledger = cell.write().expect(POISONED);
        // Re-read under the lock: the expense may have been amended or
        // reversed while we were acquiring it.
        let current = self.find_expense(req.expense_id)?;
        let group = self.load_group(current.group_id)?;

        let action = GroupAction::AmendExpense {
            payer: current.payer,
            participants: req.new_splits.keys().copied().collect(),
        };
        self.guard(req.actor, &group, &action)?;
        ensure_group_currency(&group, &req.new_total_amount)?;
        validate_splits(&group, current.payer, &req.new_total_amount, &req.new_splits)?;

        let amended = Expense {
            expense_id: current.expense_id,
            group_id: current.group_id,
            payer: current.payer,
            total_amount: req.new_total_amount,
            splits: req.new_splits,
            description: req.new_description,
            category: req.new_category,
            receipt: req.new_receipt,
            created_at: current.created_at,
        };

        ledger.retract_expense(&current)?;
        if let Err(err) = ledger.apply_expense(&amended) {
            // Restoring the just-retracted deltas cannot fail.
            let _ = ledger.apply_expense(&current);
            return Err(err.into());
        }
        self.store.upsert_expense(amended.clone());

        info!(expense_id = %amended.expense_id, group_id = %amended.group_id, "expense amended");
        Ok(amended)
    }

    /// Delete an expense, undoing the exact deltas it applied rather than
    /// recomputing from scratch.
    pub fn reverse_expense(&self, req: ReverseExpense) -> EngineResult<()> {
        let expense = self.find_expense(req.expense_id)?;
        let cell = self.balance_cell(expense.group_id)?;
        let mut ledger = cell.write().expect(POISONED);
        let expense = self.find_expense(req.expense_id)?;
        let group = self.load_group(expense.group_id)?;

        self.guard(req.actor, &group, &GroupAction::ReverseExpense)?;

        ledger.retract_expense(&expense)?;
        self.store.remove_expense(expense.expense_id);

        info!(expense_id = %expense.expense_id, group_id = %expense.group_id, "expense reversed");
        Ok(())
    }

    /// Record a settlement. No balance effect until completion.
    pub fn record_settlement(&self, req: RecordSettlement) -> EngineResult<Settlement> {
        let cell = self.balance_cell(req.group_id)?;
        // No balance change here, but the lock keeps the currency check
        // stable against a concurrent settings change.
        let _serialized = cell.write().expect(POISONED);
        let group = self.load_group(req.group_id)?;

        let action = GroupAction::RecordSettlement { from: req.from, to: req.to };
        self.guard(req.actor, &group, &action)?;
        if req.from == req.to {
            return Err(EngineError::validation(
                "settlement must be between two distinct members",
            ));
        }
        if !req.amount.is_positive() {
            return Err(EngineError::validation("settlement amount must be positive"));
        }
        ensure_group_currency(&group, &req.amount)?;

        let settlement = Settlement {
            settlement_id: SettlementId::new(),
            group_id: req.group_id,
            from: req.from,
            to: req.to,
            amount: req.amount,
            method: req.method,
            notes: req.notes,
            status: SettlementStatus::Pending,
            created_at: req.occurred_at,
        };
        self.store.upsert_settlement(settlement.clone());

        info!(
            settlement_id = %settlement.settlement_id,
            group_id = %settlement.group_id,
            "settlement recorded"
        );
        Ok(settlement)
    }

    /// Complete a settlement, applying it to the balances.
    ///
    /// Idempotent: completing an already-completed settlement returns it
    /// unchanged and applies nothing, so retried requests are tolerated.
    pub fn complete_settlement(&self, req: CompleteSettlement) -> EngineResult<Settlement> {
        let settlement = self.find_settlement(req.settlement_id)?;
        if settlement.is_completed() {
            debug!(settlement_id = %settlement.settlement_id, "settlement already completed");
            return Ok(settlement);
        }

        let cell = self.balance_cell(settlement.group_id)?;
        let mut ledger = cell.write().expect(POISONED);
        // Re-read under the lock; a concurrent retry may have won.
        let mut settlement = self.find_settlement(req.settlement_id)?;
        if settlement.is_completed() {
            return Ok(settlement);
        }

        ledger.apply_settlement(&settlement)?;
        settlement.complete();
        self.store.upsert_settlement(settlement.clone());

        info!(
            settlement_id = %settlement.settlement_id,
            group_id = %settlement.group_id,
            amount = %settlement.amount,
            "settlement completed"
        );
        Ok(settlement)
    }

    /// Add a member (admin only). A former member rejoins.
    pub fn add_member(&self, req: AddMember) -> EngineResult<()> {
        let cell = self.balance_cell(req.group_id)?;
        let _serialized = cell.write().expect(POISONED);
        let mut group = self.load_group(req.group_id)?;

        self.guard(req.actor, &group, &GroupAction::AddMember { new_member: req.new_member })?;
        group.add_member(req.new_member, req.occurred_at)?;
        self.store.upsert_group(group);

        info!(group_id = %req.group_id, member = %req.new_member, "member added");
        Ok(())
    }

    /// Remove a member (admin only; last-admin protected). The member is
    /// retained as a former member so their ledger history stays valid.
    pub fn remove_member(&self, req: RemoveMember) -> EngineResult<()> {
        let cell = self.balance_cell(req.group_id)?;
        let _serialized = cell.write().expect(POISONED);
        let mut group = self.load_group(req.group_id)?;

        self.guard(req.actor, &group, &GroupAction::RemoveMember { member: req.member })?;
        group.remove_member(req.member)?;
        self.store.upsert_group(group);

        info!(group_id = %req.group_id, member = %req.member, "member removed");
        Ok(())
    }

    /// Update group settings (admin only). A currency change is rejected
    /// once any expense or settlement exists.
    pub fn update_group_settings(&self, req: UpdateGroupSettings) -> EngineResult<Group> {
        let cell = self.balance_cell(req.group_id)?;
        let mut ledger = cell.write().expect(POISONED);
        let mut group = self.load_group(req.group_id)?;

        self.guard(req.actor, &group, &GroupAction::UpdateGroupSettings)?;

        if let Some(currency) = &req.currency {
            if currency != group.currency() {
                let has_activity = !self.store.list_expenses(req.group_id).is_empty()
                    || !self.store.list_settlements(req.group_id).is_empty();
                if has_activity {
                    return Err(EngineError::validation(
                        "cannot change group currency once expenses or settlements exist",
                    ));
                }
                *ledger = GroupBalances::new(currency.clone());
            }
        }

        group.update_settings(req.name, req.description, req.currency)?;
        self.store.upsert_group(group.clone());

        info!(group_id = %group.id(), "group settings updated");
        Ok(group)
    }

    // ── reads ────────────────────────────────────────────────────────────

    /// All non-zero normalized `(debtor, creditor, amount)` balances.
    pub fn get_balances(&self, group_id: GroupId) -> EngineResult<Vec<(MemberId, MemberId, Money)>> {
        let cell = self.balance_cell(group_id)?;
        let ledger = cell.read().expect(POISONED);
        Ok(ledger.entries().collect())
    }

    /// Signed net debt of `a` toward `b`; positive means a owes b.
    pub fn net_balance(&self, group_id: GroupId, a: MemberId, b: MemberId) -> EngineResult<Money> {
        let cell = self.balance_cell(group_id)?;
        let ledger = cell.read().expect(POISONED);
        Ok(ledger.net_balance(a, b))
    }

    /// Minimal transfer set clearing all debts. Pure projection of the
    /// current ledger state; deterministic for identical state.
    pub fn suggested_transfers(&self, group_id: GroupId) -> EngineResult<Vec<Transfer>> {
        let cell = self.balance_cell(group_id)?;
        let ledger = cell.read().expect(POISONED);
        Ok(simplify(&ledger))
    }

    /// Total spent: sum of active (non-reversed) expense totals, derived on
    /// demand, not a running counter.
    pub fn total_spent(&self, group_id: GroupId) -> EngineResult<Money> {
        let group = self.load_group(group_id)?;
        let mut total = Money::zero(group.currency().clone());
        for expense in self.store.list_expenses(group_id) {
            total = total.checked_add(&expense.total_amount)?;
        }
        Ok(total)
    }

    /// Active expenses of a group, oldest first.
    pub fn expenses_for_group(&self, group_id: GroupId) -> EngineResult<Vec<Expense>> {
        self.load_group(group_id)?;
        let mut expenses = self.store.list_expenses(group_id);
        expenses.sort_by_key(|e| (e.created_at, e.expense_id));
        Ok(expenses)
    }

    /// Settlements of a group (pending and completed), oldest first.
    pub fn settlements_for_group(&self, group_id: GroupId) -> EngineResult<Vec<Settlement>> {
        self.load_group(group_id)?;
        let mut settlements = self.store.list_settlements(group_id);
        settlements.sort_by_key(|s| (s.created_at, s.settlement_id));
        Ok(settlements)
    }

    // ── internals ────────────────────────────────────────────────────────

    fn load_group(&self, group_id: GroupId) -> EngineResult<Group> {
        self.store
            .get_group(group_id)
            .ok_or(EngineError::GroupNotFound(group_id))
    }

    fn find_expense(&self, expense_id: ExpenseId) -> EngineResult<Expense> {
        self.store
            .get_expense(expense_id)
            .ok_or(EngineError::ExpenseNotFound(expense_id))
    }

    fn find_settlement(&self, settlement_id: SettlementId) -> EngineResult<Settlement> {
        self.store
            .get_settlement(settlement_id)
            .ok_or(EngineError::SettlementNotFound(settlement_id))
    }

    fn guard(&self, actor: MemberId, group: &Group, action: &GroupAction) -> EngineResult<()> {
        authorize(actor, group, action).map_err(|err| {
            warn!(group_id = %group.id(), %actor, error = %err, "authorization denied");
            EngineError::Auth(err)
        })
    }

    /// Fetch the balance cell for a group, hydrating it from stored records
    /// on first touch (engine constructed over a pre-populated store).
    fn balance_cell(&self, group_id: GroupId) -> EngineResult<Arc<RwLock<GroupBalances>>> {
        if let Some(cell) = self.balances.read().expect(POISONED).get(&group_id) {
            return Ok(cell.clone());
        }

        // Hydrate outside the registry lock; replay order is irrelevant
        // because balance deltas commute. A concurrent first touch builds
        // identical content and only one insert wins.
        let group = self.load_group(group_id)?;
        let mut hydrated = GroupBalances::new(group.currency().clone());
        for expense in self.store.list_expenses(group_id) {
            hydrated.apply_expense(&expense)?;
        }
        for settlement in self.store.list_settlements(group_id) {
            if settlement.is_completed() {
                hydrated.apply_settlement(&settlement)?;
            }
        }

        let mut cells = self.balances.write().expect(POISONED);
        let cell = cells
            .entry(group_id)
            .or_insert_with(|| Arc::new(RwLock::new(hydrated)))
            .clone();
        Ok(cell)
    }
}

fn ensure_group_currency(group: &Group, amount: &Money) -> EngineResult<()> {
    if amount.currency() == group.currency() {
        Ok(())
    } else {
        Err(EngineError::Money(MoneyError::CurrencyMismatch {
            left: amount.currency().clone(),
            right: group.currency().clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use splitledger_core::Currency;
    use splitledger_infra::InMemoryLedgerStore;
    use splitledger_ledger::{ExpenseCategory, SettlementMethod};
    use std::collections::BTreeMap;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::new("USD").unwrap())
    }

    /// Balances survive an engine restart: a fresh engine over the same
    /// store rebuilds identical state on first touch.
    #[test]
    fn fresh_engine_hydrates_balances_from_the_store() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = LedgerEngine::new(store.clone());

        let alice = MemberId::new();
        let bob = MemberId::new();
        let group = engine
            .create_group(CreateGroup {
                name: "Flat".to_string(),
                description: String::new(),
                currency: Currency::new("USD").unwrap(),
                creator: alice,
                founding_members: vec![bob],
                occurred_at: Utc::now(),
            })
            .unwrap();

        engine
            .record_expense(RecordExpense {
                group_id: group.id(),
                actor: alice,
                payer: alice,
                total_amount: usd(1000),
                splits: BTreeMap::from([(alice, usd(500)), (bob, usd(500))]),
                description: "groceries".to_string(),
                category: ExpenseCategory::Food,
                receipt: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
        let settlement = engine
            .record_settlement(RecordSettlement {
                group_id: group.id(),
                actor: bob,
                from: bob,
                to: alice,
                amount: usd(200),
                method: SettlementMethod::Cash,
                notes: String::new(),
                occurred_at: Utc::now(),
            })
            .unwrap();
        engine
            .complete_settlement(CompleteSettlement { settlement_id: settlement.settlement_id })
            .unwrap();

        let rebuilt = LedgerEngine::new(store);
        assert_eq!(rebuilt.net_balance(group.id(), bob, alice).unwrap(), usd(300));
        assert_eq!(
            rebuilt.get_balances(group.id()).unwrap(),
            engine.get_balances(group.id()).unwrap()
        );
    }

    /// Pending settlements must not be replayed into hydrated balances.
    #[test]
    fn hydration_skips_pending_settlements() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = LedgerEngine::new(store.clone());

        let alice = MemberId::new();
        let bob = MemberId::new();
        let group = engine
            .create_group(CreateGroup {
                name: "Trip".to_string(),
                description: String::new(),
                currency: Currency::new("USD").unwrap(),
                creator: alice,
                founding_members: vec![bob],
                occurred_at: Utc::now(),
            })
            .unwrap();

        engine
            .record_expense(RecordExpense {
                group_id: group.id(),
                actor: alice,
                payer: alice,
                total_amount: usd(600),
                splits: BTreeMap::from([(bob, usd(600))]),
                description: "tickets".to_string(),
                category: ExpenseCategory::Transport,
                receipt: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
        engine
            .record_settlement(RecordSettlement {
                group_id: group.id(),
                actor: bob,
                from: bob,
                to: alice,
                amount: usd(600),
                method: SettlementMethod::BankTransfer,
                notes: "will wire tonight".to_string(),
                occurred_at: Utc::now(),
            })
            .unwrap();

        let rebuilt = LedgerEngine::new(store);
        assert_eq!(rebuilt.net_balance(group.id(), bob, alice).unwrap(), usd(600));
    }

    #[test]
    fn unknown_group_is_a_typed_not_found() {
        let engine = LedgerEngine::new(InMemoryLedgerStore::new());
        let group_id = GroupId::new();
        assert_eq!(
            engine.get_balances(group_id).unwrap_err(),
            EngineError::GroupNotFound(group_id)
        );
    }
}
