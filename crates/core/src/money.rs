//! Exact fixed-point money arithmetic.
//!
//! Amounts are integer minor units (e.g. cents) tagged with a currency.
//! Monetary state never touches floating point; every operation that could
//! lose exactness is explicit about how the remainder is assigned.

use core::cmp::Ordering;
use core::str::FromStr;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arithmetic or construction failure on monetary values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Two amounts of different currencies were combined or compared.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// The result does not fit in 64-bit minor units.
    #[error("money amount overflow")]
    Overflow,

    /// A currency code failed validation.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// `mul_rational` was given a zero denominator.
    #[error("zero denominator")]
    ZeroDenominator,

    /// `split_evenly` was asked to split across zero recipients.
    #[error("cannot split across zero recipients")]
    EmptySplit,
}

/// ISO-4217-like currency code: exactly three ASCII uppercase letters.
///
/// Codes are opaque at this layer; mapping codes to symbols/precision is a
/// presentation concern and stays outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(Cow<'static, str>);

impl Currency {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Result<Self, MoneyError> {
        let code = code.into();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(MoneyError::InvalidCurrency(code.into_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s.to_string())
    }
}

/// Rounding mode for inexact scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Truncate toward zero.
    Down,
    /// Round half away from zero.
    HalfUp,
}

/// An exact amount of money in minor units.
///
/// Immutable value object: operations return new values. Negative amounts are
/// legal (a credit); sign conventions are the caller's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g. cents).
    amount: i64,
    currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn minor_units(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            })
        }
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Negated amount. Saturates in the degenerate `i64::MIN` case, which is
    /// unreachable for validated (positive-total) ledger amounts.
    pub fn negated(&self) -> Money {
        Money::new(self.amount.saturating_neg(), self.currency.clone())
    }

    /// Same-currency comparison; comparing across currencies is an error, not
    /// an ordering.
    pub fn cmp_amount(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Multiply by `numerator / denominator` with an explicit rounding mode.
    ///
    /// The intermediate product is computed in 128 bits, so the only overflow
    /// is a result outside 64-bit minor units.
    pub fn mul_rational(
        &self,
        numerator: i64,
        denominator: i64,
        rounding: Rounding,
    ) -> Result<Money, MoneyError> {
        if denominator == 0 {
            return Err(MoneyError::ZeroDenominator);
        }

        let scaled = i128::from(self.amount) * i128::from(numerator);
        let den = i128::from(denominator);
        let quotient = scaled / den;
        let remainder = scaled % den;

        let rounded = match rounding {
            Rounding::Down => quotient,
            Rounding::HalfUp if remainder == 0 => quotient,
            Rounding::HalfUp => {
                if remainder.abs() * 2 >= den.abs() {
                    // One step away from zero.
                    let step = if (scaled < 0) != (den < 0) { -1 } else { 1 };
                    quotient + step
                } else {
                    quotient
                }
            }
        };

        let amount = i64::try_from(rounded).map_err(|_| MoneyError::Overflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Split into `parts` amounts that sum back to the original exactly.
    ///
    /// The quotient is distributed evenly and the remainder minor units go to
    /// the *first* entries, one each. Callers pair the result with recipients
    /// in ascending `MemberId` order; that pairing is the single place
    /// fairness ties are broken, and it must stay stable across runs.
    pub fn split_evenly(&self, parts: usize) -> Result<Vec<Money>, MoneyError> {
        if parts == 0 {
            return Err(MoneyError::EmptySplit);
        }
        let parts_i = i64::try_from(parts).map_err(|_| MoneyError::Overflow)?;

        // div_euclid/rem_euclid keep the remainder non-negative, so the
        // "first entries get one extra" rule holds for negative totals too.
        let base = self.amount.div_euclid(parts_i);
        let extra = self.amount.rem_euclid(parts_i);

        Ok((0..parts_i)
            .map(|i| {
                let amount = if i < extra { base + 1 } else { base };
                Money::new(amount, self.currency.clone())
            })
            .collect())
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Minor units; human formatting is a presentation concern.
        write!(f, "{} {}", self.amount, self.currency)
    }
}
