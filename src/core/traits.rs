//! Core trait for ledger operations
//!
//! The replay layer is written against this trait rather than the concrete
//! engine, so alternative engines can be swapped in behind the same
//! operation set.

use crate::types::{AccountId, LedgerError, Money};
use rust_decimal::Decimal;

/// The ledger operation set
///
/// All methods take `&self`: implementations synchronize internally and can
/// be shared across threads.
pub trait Ledger: Send + Sync {
    /// Create an account funded with `initial` and return its identifier
    fn create_account(&self, initial: Money) -> Result<AccountId, LedgerError>;

    /// Credit `amount` to the account
    fn deposit(&self, id: AccountId, amount: Money) -> Result<(), LedgerError>;

    /// Debit `amount` from the account, all-or-nothing
    fn withdraw(&self, id: AccountId, amount: Money) -> Result<(), LedgerError>;

    /// Move `amount` from one account to another, atomically
    fn transfer(&self, from: AccountId, to: AccountId, amount: Money) -> Result<(), LedgerError>;

    /// Current balance of the account
    fn balance(&self, id: AccountId) -> Result<Decimal, LedgerError>;
}
