use std::collections::BTreeMap;

use thiserror::Error;

use splitledger_core::{MemberId, Money, MoneyError};
use splitledger_groups::Group;

/// Validation failure on an expense's split shape (user-correctable).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("expense total must be positive, got {0}")]
    NonPositiveTotal(Money),

    #[error("split references non-member {0}")]
    UnknownMember(MemberId),

    #[error("splits must be non-negative with at least one positive share")]
    DegenerateSplit,

    /// Carries the actual sum for diagnostics.
    #[error("splits sum to {actual} but the expense total is {expected}")]
    SplitMismatch { expected: Money, actual: Money },

    #[error(transparent)]
    Currency(#[from] MoneyError),
}

/// Validate an expense's per-member shares against its total.
///
/// Checks, in order: positive total; payer and every split member are
/// current group members; shares are non-negative and not all zero; shares
/// sum to the total exactly. The validator only checks: weighted or
/// percentage splits arrive already resolved to Money amounts.
pub fn validate_splits(
    group: &Group,
    payer: MemberId,
    total: &Money,
    splits: &BTreeMap<MemberId, Money>,
) -> Result<(), SplitError> {
    if !total.is_positive() {
        return Err(SplitError::NonPositiveTotal(total.clone()));
    }

    if !group.is_member(payer) {
        return Err(SplitError::UnknownMember(payer));
    }
    for member in splits.keys() {
        if !group.is_member(*member) {
            return Err(SplitError::UnknownMember(*member));
        }
    }

    if splits.values().any(Money::is_negative) || !splits.values().any(Money::is_positive) {
        return Err(SplitError::DegenerateSplit);
    }

    let mut sum = Money::zero(total.currency().clone());
    for share in splits.values() {
        sum = sum.checked_add(share)?;
    }
    if sum != *total {
        return Err(SplitError::SplitMismatch {
            expected: total.clone(),
            actual: sum,
        });
    }

    Ok(())
}

/// Equal-split convenience: one share per member, summing to `total` exactly.
///
/// Members are taken in ascending `MemberId` order (duplicates collapse);
/// the first `total mod n` members absorb one extra minor unit each, the
/// deterministic fairness tie-break.
pub fn equal_splits(
    total: &Money,
    members: &[MemberId],
) -> Result<BTreeMap<MemberId, Money>, SplitError> {
    let mut ordered: Vec<MemberId> = members.to_vec();
    ordered.sort();
    ordered.dedup();
    if ordered.is_empty() {
        return Err(SplitError::DegenerateSplit);
    }

    let shares = total.split_evenly(ordered.len())?;
    Ok(ordered.into_iter().zip(shares).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use splitledger_core::{Currency, GroupId};
    use uuid::Uuid;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::new("USD").unwrap())
    }

    fn member(n: u128) -> MemberId {
        MemberId::from_uuid(Uuid::from_u128(n))
    }

    fn test_group(members: &[MemberId]) -> Group {
        Group::create(
            GroupId::new(),
            "Dinner club",
            "",
            Currency::new("USD").unwrap(),
            members[0],
            &members[1..],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn accepts_exact_splits() {
        let (a, b, c) = (member(1), member(2), member(3));
        let group = test_group(&[a, b, c]);
        let splits = BTreeMap::from([(a, usd(34)), (b, usd(33)), (c, usd(33))]);
        assert!(validate_splits(&group, a, &usd(100), &splits).is_ok());
    }

    #[test]
    fn rejects_non_positive_total() {
        let a = member(1);
        let group = test_group(&[a]);
        let splits = BTreeMap::from([(a, usd(0))]);
        assert_eq!(
            validate_splits(&group, a, &usd(0), &splits).unwrap_err(),
            SplitError::NonPositiveTotal(usd(0))
        );
    }

    #[test]
    fn rejects_split_for_non_member() {
        let (a, b) = (member(1), member(2));
        let group = test_group(&[a]);
        let splits = BTreeMap::from([(a, usd(50)), (b, usd(50))]);
        assert_eq!(
            validate_splits(&group, a, &usd(100), &splits).unwrap_err(),
            SplitError::UnknownMember(b)
        );
    }

    #[test]
    fn rejects_negative_and_all_zero_splits() {
        let (a, b) = (member(1), member(2));
        let group = test_group(&[a, b]);

        let negative = BTreeMap::from([(a, usd(150)), (b, usd(-50))]);
        assert_eq!(
            validate_splits(&group, a, &usd(100), &negative).unwrap_err(),
            SplitError::DegenerateSplit
        );

        let all_zero = BTreeMap::from([(a, usd(0)), (b, usd(0))]);
        assert_eq!(
            validate_splits(&group, a, &usd(100), &all_zero).unwrap_err(),
            SplitError::DegenerateSplit
        );

        let empty = BTreeMap::new();
        assert_eq!(
            validate_splits(&group, a, &usd(100), &empty).unwrap_err(),
            SplitError::DegenerateSplit
        );
    }

    #[test]
    fn mismatched_sum_reports_the_actual_sum() {
        let (a, b) = (member(1), member(2));
        let group = test_group(&[a, b]);
        let splits = BTreeMap::from([(a, usd(50)), (b, usd(49))]);
        assert_eq!(
            validate_splits(&group, a, &usd(100), &splits).unwrap_err(),
            SplitError::SplitMismatch { expected: usd(100), actual: usd(99) }
        );
    }

    #[test]
    fn currency_disagreement_surfaces_as_currency_error() {
        let (a, b) = (member(1), member(2));
        let group = test_group(&[a, b]);
        let eur = Money::new(50, Currency::new("EUR").unwrap());
        let splits = BTreeMap::from([(a, usd(50)), (b, eur)]);
        assert!(matches!(
            validate_splits(&group, a, &usd(100), &splits),
            Err(SplitError::Currency(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn equal_splits_gives_extra_minor_units_to_first_members_in_order() {
        let (a, b, c) = (member(1), member(2), member(3));
        // Deliberately unsorted input; the split must key off MemberId order.
        let splits = equal_splits(&usd(100), &[c, a, b]).unwrap();

        assert_eq!(splits[&a], usd(34));
        assert_eq!(splits[&b], usd(33));
        assert_eq!(splits[&c], usd(33));

        let sum: i64 = splits.values().map(Money::minor_units).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn equal_splits_rejects_empty_member_set() {
        assert_eq!(
            equal_splits(&usd(100), &[]).unwrap_err(),
            SplitError::DegenerateSplit
        );
    }
}
