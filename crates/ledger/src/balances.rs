use std::collections::BTreeMap;

use splitledger_core::{Currency, MemberId, Money, MoneyError};

use crate::{Expense, Settlement};

/// Normalized pairwise debt state for one group.
///
/// Stored convention: key `(debtor, creditor)` with a strictly positive
/// amount in minor units. The reverse direction of a pair is never stored
/// and zero entries are removed, so querying `(b, a)` is the negation of
/// `(a, b)` or zero. `BTreeMap` gives the deterministic iteration order the
/// simplifier and tests rely on.
///
/// Mutations are read-modify-write on shared pair state; callers serialize
/// them per group (the engine holds a per-group write lock).
///
/// Derived state: never persisted, always rebuildable from the stored
/// expense and settlement records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBalances {
    currency: Currency,
    debts: BTreeMap<(MemberId, MemberId), i64>,
}

impl GroupBalances {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            debts: BTreeMap::new(),
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// True when no member owes anything.
    pub fn is_settled(&self) -> bool {
        self.debts.is_empty()
    }

    fn ensure_currency(&self, amount: &Money) -> Result<(), MoneyError> {
        if amount.currency() == &self.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: amount.currency().clone(),
                right: self.currency.clone(),
            })
        }
    }

    /// Net `delta` minor units onto `debtor -> creditor`, renormalizing the
    /// stored direction. Negative deltas reduce the debt and may flip it.
    fn adjust(
        &mut self,
        debtor: MemberId,
        creditor: MemberId,
        delta: i64,
    ) -> Result<(), MoneyError> {
        if debtor == creditor || delta == 0 {
            return Ok(());
        }

        let forward = self.debts.remove(&(debtor, creditor)).unwrap_or(0);
        let reverse = self.debts.remove(&(creditor, debtor)).unwrap_or(0);
        let net = i128::from(forward) - i128::from(reverse) + i128::from(delta);
        let net = i64::try_from(net).map_err(|_| {
            // Restore what we removed before failing; the caller's state must
            // not be half-updated.
            if forward != 0 {
                self.debts.insert((debtor, creditor), forward);
            }
            if reverse != 0 {
                self.debts.insert((creditor, debtor), reverse);
            }
            MoneyError::Overflow
        })?;

        match net.cmp(&0) {
            core::cmp::Ordering::Greater => {
                self.debts.insert((debtor, creditor), net);
            }
            core::cmp::Ordering::Less => {
                self.debts.insert((creditor, debtor), -net);
            }
            core::cmp::Ordering::Equal => {}
        }
        Ok(())
    }

    /// Apply a recorded expense: every split member with a positive share
    /// (other than the payer) now owes the payer that share.
    ///
    /// The only mutation path for expenses; called exactly once per record.
    pub fn apply_expense(&mut self, expense: &Expense) -> Result<(), MoneyError> {
        self.ensure_currency(&expense.total_amount)?;
        for (member, share) in &expense.splits {
            if *member == expense.payer || !share.is_positive() {
                continue;
            }
            self.ensure_currency(share)?;
            self.adjust(*member, expense.payer, share.minor_units())?;
        }
        Ok(())
    }

    /// Exact inverse of `apply_expense`: decreases the same pairs by the same
    /// amounts. O(k) in split count, never recomputed from scratch.
    pub fn retract_expense(&mut self, expense: &Expense) -> Result<(), MoneyError> {
        self.ensure_currency(&expense.total_amount)?;
        for (member, share) in &expense.splits {
            if *member == expense.payer || !share.is_positive() {
                continue;
            }
            self.ensure_currency(share)?;
            self.adjust(*member, expense.payer, -share.minor_units())?;
        }
        Ok(())
    }

    /// Apply a completed settlement: reduces `from`'s debt to `to`. Overpaying
    /// legitimately flips the stored direction into a reverse debt.
    pub fn apply_settlement(&mut self, settlement: &Settlement) -> Result<(), MoneyError> {
        self.ensure_currency(&settlement.amount)?;
        self.adjust(
            settlement.from,
            settlement.to,
            -settlement.amount.minor_units(),
        )
    }

    /// Signed net debt of `a` toward `b`: positive means a owes b.
    pub fn net_balance(&self, a: MemberId, b: MemberId) -> Money {
        let forward = self.debts.get(&(a, b)).copied().unwrap_or(0);
        let reverse = self.debts.get(&(b, a)).copied().unwrap_or(0);
        Money::new(forward - reverse, self.currency.clone())
    }

    /// All non-zero pairs touching `member`, as `(other, signed amount)` with
    /// positive meaning `member` owes `other`.
    pub fn balances_for_member(&self, member: MemberId) -> Vec<(MemberId, Money)> {
        let mut by_other: BTreeMap<MemberId, i64> = BTreeMap::new();
        for (&(debtor, creditor), &amount) in &self.debts {
            if debtor == member {
                *by_other.entry(creditor).or_insert(0) += amount;
            } else if creditor == member {
                *by_other.entry(debtor).or_insert(0) -= amount;
            }
        }
        by_other
            .into_iter()
            .filter(|(_, amount)| *amount != 0)
            .map(|(other, amount)| (other, Money::new(amount, self.currency.clone())))
            .collect()
    }

    /// All stored `(debtor, creditor, amount)` triples, normalized and
    /// strictly positive, in deterministic key order.
    pub fn entries(&self) -> impl Iterator<Item = (MemberId, MemberId, Money)> + '_ {
        self.debts
            .iter()
            .map(|(&(debtor, creditor), &amount)| {
                (debtor, creditor, Money::new(amount, self.currency.clone()))
            })
    }

    /// Net position per member in minor units: owed-to-them minus they-owe.
    /// Members netting to zero are omitted. Sums to zero (conservation).
    pub(crate) fn net_positions_minor(&self) -> BTreeMap<MemberId, i64> {
        let mut positions: BTreeMap<MemberId, i64> = BTreeMap::new();
        for (&(debtor, creditor), &amount) in &self.debts {
            *positions.entry(debtor).or_insert(0) -= amount;
            *positions.entry(creditor).or_insert(0) += amount;
        }
        positions.retain(|_, net| *net != 0);
        positions
    }
}
