//! Positive monetary amounts
//!
//! `Money` is the only way an amount enters the ledger. Construction validates
//! that the amount is strictly positive, so every engine operation can trust
//! the value it receives without re-checking it.

use super::error::LedgerError;
use rust_decimal::Decimal;
use std::fmt;

/// A strictly positive monetary amount
///
/// Backed by `rust_decimal::Decimal` (96-bit mantissa, scale up to 28), so
/// arithmetic is exact for the amounts a ledger handles.
///
/// There is no way to build a `Money` holding zero or a negative value:
/// [`Money::new`] and the `TryFrom<Decimal>` impl are the only constructors
/// and both reject non-positive input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// Validate and wrap an amount
    ///
    /// # Arguments
    ///
    /// * `amount` - The decimal amount to wrap
    ///
    /// # Returns
    ///
    /// * `Ok(Money)` if `amount > 0`
    /// * `Err(LedgerError::InvalidAmount)` carrying the rejected amount otherwise
    pub fn new(amount: Decimal) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount));
        }
        Ok(Self { amount })
    }

    /// The wrapped amount, always greater than zero
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl TryFrom<Decimal> for Money {
    type Error = LedgerError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.amount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.amount.fmt(f)
    }
}
