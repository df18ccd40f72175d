//! Ledger engine: balance mutation under per-account locks
//!
//! This module provides the `LedgerEngine` struct, which implements account
//! creation, deposits, withdrawals, transfers and balance reads on top of the
//! [`AccountRegistry`].
//!
//! # Architecture
//!
//! ```text
//! LedgerEngine
//!     └── Arc<AccountRegistry>          (sharded id -> record map)
//!             └── Arc<AccountRecord>    (balance behind its own mutex)
//! ```
//!
//! # Locking Protocol
//!
//! - Identifiers are resolved to records first; no account lock is held while
//!   the registry is consulted.
//! - Single-account operations take that account's lock for the whole
//!   check-and-update.
//! - Transfers take both locks in ascending [`AccountId`] order, regardless of
//!   which side is the source. Every two-lock acquisition in the process
//!   follows the same global order, so no cycle of waiting threads can form.
//! - Both new balances of a transfer are computed before either is written,
//!   and both writes happen while both locks are held.
//!
//! # Thread Safety
//!
//! The engine is cheaply cloneable; clones share the same registry. All
//! operations take `&self` and may be called from any number of threads.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::{AccountRegistry, Ledger};
use crate::types::{AccountId, AccountSnapshot, LedgerError, Money};

/// Concurrency-safe ledger over a shared account registry
///
/// Accounts are addressed by [`AccountId`] only; the registry and its records
/// are not reachable through the engine:
///
/// ```compile_fail
/// let engine = ledger_engine::LedgerEngine::new();
/// let _registry = engine.registry();
/// ```
#[derive(Debug, Clone, Default)]
pub struct LedgerEngine {
    registry: Arc<AccountRegistry>,
}

impl LedgerEngine {
    /// Create an engine over a fresh, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine over an existing registry
    ///
    /// Engines built over the same registry operate on the same accounts.
    pub fn with_registry(registry: Arc<AccountRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this engine
    pub(crate) fn registry(&self) -> &Arc<AccountRegistry> {
        &self.registry
    }

    /// Create an account funded with `initial`
    ///
    /// # Returns
    ///
    /// * `Ok(AccountId)` - The new account's identifier
    /// * `Err(LedgerError::AccountIdCollision)` - Identifier collision (unreachable in practice)
    pub fn create_account(&self, initial: Money) -> Result<AccountId, LedgerError> {
        let id = self.registry.create(initial)?;
        debug!(account = %id, initial = %initial, "account created");
        Ok(id)
    }

    /// Credit `amount` to the account
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The balance grew by exactly `amount`
    /// * `Err(LedgerError::AccountNotFound)` - Unknown identifier
    /// * `Err(LedgerError::ArithmeticOverflow)` - The balance would exceed the decimal range
    pub fn deposit(&self, id: AccountId, amount: Money) -> Result<(), LedgerError> {
        let account = self.registry.lookup(id)?;

        let mut balance = account.lock();
        *balance = balance
            .checked_add(amount.amount())
            .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", id))?;
        debug!(account = %id, amount = %amount, balance = %*balance, "deposit applied");

        Ok(())
    }

    /// Debit `amount` from the account
    ///
    /// The sufficient-funds check and the debit happen under the same lock
    /// acquisition; no partial withdrawal is ever made.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The balance shrank by exactly `amount`
    /// * `Err(LedgerError::AccountNotFound)` - Unknown identifier
    /// * `Err(LedgerError::InsufficientFunds)` - `amount` exceeds the balance; nothing changed
    pub fn withdraw(&self, id: AccountId, amount: Money) -> Result<(), LedgerError> {
        let account = self.registry.lookup(id)?;

        let mut balance = account.lock();
        *balance = debit(*balance, amount, id, "withdraw")?;
        debug!(account = %id, amount = %amount, balance = %*balance, "withdrawal applied");

        Ok(())
    }

    /// Move `amount` from `from` to `to`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - `from` shrank and `to` grew by exactly `amount`
    /// * `Err(LedgerError::SelfTransfer)` - `from == to`; checked before any lookup
    /// * `Err(LedgerError::AccountNotFound)` - Either identifier is unknown
    /// * `Err(LedgerError::InsufficientFunds)` - `amount` exceeds `from`'s balance
    /// * `Err(LedgerError::ArithmeticOverflow)` - `to`'s balance would overflow
    ///
    /// On every error path both balances are unchanged.
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Money) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::self_transfer(from));
        }

        let source = self.registry.lookup(from)?;
        let destination = self.registry.lookup(to)?;

        let (mut source_balance, mut destination_balance) = if from < to {
            let s = source.lock();
            let d = destination.lock();
            (s, d)
        } else {
            let d = destination.lock();
            let s = source.lock();
            (s, d)
        };

        let new_source = debit(*source_balance, amount, from, "transfer")?;
        let new_destination = destination_balance
            .checked_add(amount.amount())
            .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", to))?;

        *source_balance = new_source;
        *destination_balance = new_destination;
        debug!(from = %from, to = %to, amount = %amount, "transfer applied");

        Ok(())
    }

    /// Current balance of the account, read under its lock
    ///
    /// # Returns
    ///
    /// * `Ok(Decimal)` - The balance
    /// * `Err(LedgerError::AccountNotFound)` - Unknown identifier
    pub fn balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        Ok(self.registry.lookup(id)?.balance())
    }

    /// Snapshot every account, each read under its own lock
    ///
    /// Accounts are locked one at a time, so concurrent transfers may land
    /// between two reads. Once all writers have finished the snapshot is
    /// exact. Returned in ascending identifier order.
    pub fn accounts(&self) -> Vec<AccountSnapshot> {
        let mut snapshots: Vec<AccountSnapshot> = self
            .registry
            .records()
            .iter()
            .map(|record| record.snapshot())
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }
}

/// Subtract `amount` from `balance`, refusing to go below zero
fn debit(balance: Decimal, amount: Money, id: AccountId, operation: &str) -> Result<Decimal, LedgerError> {
    if balance < amount.amount() {
        debug!(account = %id, balance = %balance, requested = %amount, operation, "insufficient funds");
        return Err(LedgerError::insufficient_funds(balance, amount.amount()));
    }

    balance
        .checked_sub(amount.amount())
        .ok_or_else(|| LedgerError::arithmetic_overflow(operation, id))
}

impl Ledger for LedgerEngine {
    fn create_account(&self, initial: Money) -> Result<AccountId, LedgerError> {
        LedgerEngine::create_account(self, initial)
    }

    fn deposit(&self, id: AccountId, amount: Money) -> Result<(), LedgerError> {
        LedgerEngine::deposit(self, id, amount)
    }

    fn withdraw(&self, id: AccountId, amount: Money) -> Result<(), LedgerError> {
        LedgerEngine::withdraw(self, id, amount)
    }

    fn transfer(&self, from: AccountId, to: AccountId, amount: Money) -> Result<(), LedgerError> {
        LedgerEngine::transfer(self, from, to, amount)
    }

    fn balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        LedgerEngine::balance(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::thread;
    use uuid::Uuid;

    fn money(n: i64) -> Money {
        Money::new(Decimal::new(n, 0)).unwrap()
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn test_create_account_sets_initial_balance() {
        let engine = LedgerEngine::new();

        let id = engine.create_account(money(100)).unwrap();

        assert_eq!(engine.balance(id).unwrap(), dec(100));
    }

    #[test]
    fn test_engine_clones_share_accounts() {
        let engine = LedgerEngine::new();
        let clone = engine.clone();

        let id = engine.create_account(money(10)).unwrap();
        clone.deposit(id, money(5)).unwrap();

        assert_eq!(engine.balance(id).unwrap(), dec(15));
        assert!(Arc::ptr_eq(engine.registry(), clone.registry()));
    }

    #[test]
    fn test_with_registry_uses_given_registry() {
        let registry = Arc::new(AccountRegistry::new());
        let id = registry.create(money(7)).unwrap();

        let engine = LedgerEngine::with_registry(Arc::clone(&registry));

        assert_eq!(engine.balance(id).unwrap(), dec(7));
    }

    #[test]
    fn test_deposit_increases_balance() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();

        engine.deposit(id, money(50)).unwrap();

        assert_eq!(engine.balance(id).unwrap(), dec(150));
    }

    #[test]
    fn test_deposit_overflow_leaves_balance_unchanged() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(Money::new(Decimal::MAX).unwrap()).unwrap();

        let result = engine.deposit(id, money(1));

        assert_eq!(result, Err(LedgerError::arithmetic_overflow("deposit", id)));
        assert_eq!(engine.balance(id).unwrap(), Decimal::MAX);
    }

    #[test]
    fn test_withdraw_decreases_balance() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();

        engine.withdraw(id, money(40)).unwrap();

        assert_eq!(engine.balance(id).unwrap(), dec(60));
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();

        engine.withdraw(id, money(100)).unwrap();

        assert_eq!(engine.balance(id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_withdraw_insufficient_funds() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(50)).unwrap();

        let result = engine.withdraw(id, money(101));

        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                balance: dec(50),
                requested: dec(101)
            })
        );
        assert_eq!(engine.balance(id).unwrap(), dec(50));
    }

    #[test]
    fn test_transfer_moves_funds() {
        let engine = LedgerEngine::new();
        let a = engine.create_account(money(200)).unwrap();
        let b = engine.create_account(money(50)).unwrap();

        engine.transfer(a, b, money(70)).unwrap();

        assert_eq!(engine.balance(a).unwrap(), dec(130));
        assert_eq!(engine.balance(b).unwrap(), dec(120));
    }

    #[test]
    fn test_transfer_insufficient_funds_changes_nothing() {
        let engine = LedgerEngine::new();
        let from = engine.create_account(money(50)).unwrap();
        let to = engine.create_account(money(10)).unwrap();

        let result = engine.transfer(from, to, money(60));

        assert_eq!(result, Err(LedgerError::insufficient_funds(dec(50), dec(60))));
        assert_eq!(engine.balance(from).unwrap(), dec(50));
        assert_eq!(engine.balance(to).unwrap(), dec(10));
    }

    #[test]
    fn test_transfer_to_self_is_rejected() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();

        let result = engine.transfer(id, id, money(10));

        assert_eq!(result, Err(LedgerError::SelfTransfer { id }));
        assert_eq!(engine.balance(id).unwrap(), dec(100));
    }

    #[test]
    fn test_transfer_to_self_checked_before_lookup() {
        let engine = LedgerEngine::new();
        let unknown = AccountId::generate();

        let result = engine.transfer(unknown, unknown, money(1));

        assert_eq!(result, Err(LedgerError::SelfTransfer { id: unknown }));
    }

    #[test]
    fn test_transfer_to_self_while_account_locked_does_not_block() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();
        let record = engine.registry().lookup(id).unwrap();
        let _guard = record.lock();

        assert!(matches!(
            engine.transfer(id, id, money(1)),
            Err(LedgerError::SelfTransfer { .. })
        ));
    }

    #[test]
    fn test_transfer_overflow_on_destination_changes_nothing() {
        let engine = LedgerEngine::new();
        let from = engine.create_account(money(10)).unwrap();
        let to = engine.create_account(Money::new(Decimal::MAX).unwrap()).unwrap();

        let result = engine.transfer(from, to, money(1));

        assert_eq!(result, Err(LedgerError::arithmetic_overflow("transfer", to)));
        assert_eq!(engine.balance(from).unwrap(), dec(10));
        assert_eq!(engine.balance(to).unwrap(), Decimal::MAX);
    }

    #[rstest]
    #[case::unknown_source(true)]
    #[case::unknown_destination(false)]
    fn test_transfer_unknown_account(#[case] unknown_is_source: bool) {
        let engine = LedgerEngine::new();
        let known = engine.create_account(money(100)).unwrap();
        let unknown = AccountId::generate();

        let result = if unknown_is_source {
            engine.transfer(unknown, known, money(1))
        } else {
            engine.transfer(known, unknown, money(1))
        };

        assert_eq!(result, Err(LedgerError::AccountNotFound { id: unknown }));
        assert_eq!(engine.balance(known).unwrap(), dec(100));
    }

    #[test]
    fn test_operations_on_unknown_account() {
        let engine = LedgerEngine::new();
        let unknown = AccountId::generate();
        let not_found = LedgerError::account_not_found(unknown);

        assert_eq!(engine.balance(unknown), Err(not_found.clone()));
        assert_eq!(engine.deposit(unknown, money(1)), Err(not_found.clone()));
        assert_eq!(engine.withdraw(unknown, money(1)), Err(not_found));
    }

    #[test]
    fn test_transfer_in_both_directions_between_ordered_ids() {
        let registry = Arc::new(AccountRegistry::new());
        let low = AccountId::from(Uuid::from_u128(1));
        let high = AccountId::from(Uuid::from_u128(2));
        registry.insert(low, money(100)).unwrap();
        registry.insert(high, money(100)).unwrap();
        let engine = LedgerEngine::with_registry(registry);

        engine.transfer(low, high, money(30)).unwrap();
        engine.transfer(high, low, money(10)).unwrap();

        assert_eq!(engine.balance(low).unwrap(), dec(80));
        assert_eq!(engine.balance(high).unwrap(), dec(120));
    }

    #[test]
    fn test_accounts_snapshot_sorted_by_id() {
        let engine = LedgerEngine::new();
        let a = engine.create_account(money(1)).unwrap();
        let b = engine.create_account(money(2)).unwrap();
        let c = engine.create_account(money(3)).unwrap();

        let snapshots = engine.accounts();

        assert_eq!(snapshots.len(), 3);
        assert!(snapshots.windows(2).all(|w| w[0].id < w[1].id));
        let total: Decimal = snapshots.iter().map(|s| s.balance).sum();
        assert_eq!(total, dec(6));
        for id in [a, b, c] {
            assert!(snapshots.iter().any(|s| s.id == id));
        }
    }

    #[test]
    fn test_engine_usable_through_trait_object() {
        let engine = LedgerEngine::new();
        let ledger: &dyn Ledger = &engine;

        let a = ledger.create_account(money(10)).unwrap();
        let b = ledger.create_account(money(10)).unwrap();
        ledger.deposit(a, money(5)).unwrap();
        ledger.withdraw(b, money(3)).unwrap();
        ledger.transfer(a, b, money(15)).unwrap();

        assert_eq!(ledger.balance(a).unwrap(), Decimal::ZERO);
        assert_eq!(ledger.balance(b).unwrap(), dec(22));
    }

    // Concurrent access tests
    // These verify the locking protocol under contention from many threads.
    #[test]
    fn test_concurrent_deposits_same_account() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(1)).unwrap();
        let mut handles = vec![];

        for _ in 0..50 {
            let engine = engine.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..20 {
                    engine.deposit(id, money(1)).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.balance(id).unwrap(), dec(1001));
    }

    #[test]
    fn test_concurrent_withdrawals_never_overdraw() {
        let engine = LedgerEngine::new();
        let id = engine.create_account(money(100)).unwrap();
        let mut handles = vec![];

        // 200 withdrawals of 1 against a balance of 100: exactly 100 succeed.
        for _ in 0..20 {
            let engine = engine.clone();
            handles.push(thread::spawn(move || {
                (0..10)
                    .filter(|_| engine.withdraw(id, money(1)).is_ok())
                    .count()
            }));
        }

        let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(succeeded, 100);
        assert_eq!(engine.balance(id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_concurrent_opposing_transfers_conserve_total() {
        let engine = LedgerEngine::new();
        let a = engine.create_account(money(1000)).unwrap();
        let b = engine.create_account(money(1000)).unwrap();
        let mut handles = vec![];

        for i in 0..8 {
            let engine = engine.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    if i % 2 == 0 {
                        engine.transfer(a, b, money(1)).unwrap();
                    } else {
                        engine.transfer(b, a, money(1)).unwrap();
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.balance(a).unwrap(), dec(1000));
        assert_eq!(engine.balance(b).unwrap(), dec(1000));
    }

    proptest! {
        #[test]
        fn prop_deposit_is_additive(initial in 1i64..1_000_000_000, amount in 1i64..1_000_000_000, scale in 0u32..=4) {
            let engine = LedgerEngine::new();
            let id = engine.create_account(Money::new(Decimal::new(initial, scale)).unwrap()).unwrap();

            engine.deposit(id, Money::new(Decimal::new(amount, scale)).unwrap()).unwrap();

            prop_assert_eq!(engine.balance(id).unwrap(), Decimal::new(initial + amount, scale));
        }

        #[test]
        fn prop_withdraw_is_all_or_nothing(initial in 1i64..1_000_000, amount in 1i64..2_000_000) {
            let engine = LedgerEngine::new();
            let id = engine.create_account(money(initial)).unwrap();

            let result = engine.withdraw(id, money(amount));

            if amount <= initial {
                prop_assert!(result.is_ok());
                prop_assert_eq!(engine.balance(id).unwrap(), dec(initial - amount));
            } else {
                prop_assert_eq!(result, Err(LedgerError::insufficient_funds(dec(initial), dec(amount))));
                prop_assert_eq!(engine.balance(id).unwrap(), dec(initial));
            }
        }

        #[test]
        fn prop_transfer_conserves_sum(from_initial in 1i64..1_000_000, to_initial in 1i64..1_000_000, amount in 1i64..2_000_000) {
            let engine = LedgerEngine::new();
            let from = engine.create_account(money(from_initial)).unwrap();
            let to = engine.create_account(money(to_initial)).unwrap();

            let result = engine.transfer(from, to, money(amount));

            let from_after = engine.balance(from).unwrap();
            let to_after = engine.balance(to).unwrap();
            prop_assert_eq!(from_after + to_after, dec(from_initial + to_initial));
            if amount <= from_initial {
                prop_assert!(result.is_ok());
                prop_assert_eq!(from_after, dec(from_initial - amount));
                prop_assert_eq!(to_after, dec(to_initial + amount));
            } else {
                prop_assert_eq!(result, Err(LedgerError::insufficient_funds(dec(from_initial), dec(amount))));
                prop_assert_eq!(from_after, dec(from_initial));
                prop_assert_eq!(to_after, dec(to_initial));
            }
        }
    }
}
