//! Concurrent account registry
//!
//! This module provides the `AccountRegistry`, which maps account identifiers
//! to their records.
//!
//! # Design
//!
//! The registry uses `DashMap` (a sharded concurrent HashMap). Shard locks are
//! held only for the duration of an insert or a lookup; the record itself is
//! handed out as an `Arc` so no shard lock is ever held while an account lock
//! is taken. Registry traffic therefore never waits on balance traffic.
//!
//! Entries are inserted once at account creation and never removed or
//! replaced.

use super::AccountRecord;
use crate::types::{AccountId, LedgerError, Money};
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe mapping from account identifier to account record
#[derive(Debug, Default)]
pub struct AccountRegistry {
    /// Sharded map of live accounts
    accounts: DashMap<AccountId, Arc<AccountRecord>>,
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Create and register a new account
    ///
    /// Generates a fresh identifier and inserts a record holding the initial
    /// amount.
    ///
    /// # Returns
    ///
    /// * `Ok(AccountId)` - The identifier of the new account
    /// * `Err(LedgerError::AccountIdCollision)` - If the generated identifier
    ///   was already taken (the existing account is left untouched)
    pub fn create(&self, initial: Money) -> Result<AccountId, LedgerError> {
        let id = AccountId::generate();
        self.insert(id, initial)
    }

    pub(crate) fn insert(&self, id: AccountId, initial: Money) -> Result<AccountId, LedgerError> {
        let record = Arc::new(AccountRecord::new(id, initial));
        let stored = Arc::clone(
            &*self
                .accounts
                .entry(id)
                .or_insert_with(|| Arc::clone(&record)),
        );

        if !Arc::ptr_eq(&stored, &record) {
            return Err(LedgerError::AccountIdCollision { id });
        }

        Ok(id)
    }

    /// Resolve an identifier to its record
    ///
    /// Does not lock the account. Records never leave the crate; outside
    /// callers only see identifiers:
    ///
    /// ```compile_fail
    /// use ledger_engine::{AccountId, AccountRegistry};
    ///
    /// let registry = AccountRegistry::new();
    /// let _record = registry.lookup(AccountId::generate());
    /// ```
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<AccountRecord>)` - The registered record
    /// * `Err(LedgerError::AccountNotFound)` - If no account has this identifier
    pub(crate) fn lookup(&self, id: AccountId) -> Result<Arc<AccountRecord>, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Whether an account is registered under `id`
    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no account has been registered yet
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All registered identifiers, in arbitrary order
    pub fn ids(&self) -> Vec<AccountId> {
        self.accounts.iter().map(|entry| *entry.key()).collect()
    }

    /// All registered records, in arbitrary order
    pub(crate) fn records(&self) -> Vec<Arc<AccountRecord>> {
        self.accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::thread;

    fn money(n: i64) -> Money {
        Money::new(Decimal::new(n, 0)).unwrap()
    }

    #[test]
    fn test_create_registers_account_with_initial_balance() {
        let registry = AccountRegistry::new();

        let id = registry.create(money(100)).unwrap();

        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
        let record = registry.lookup(id).unwrap();
        assert_eq!(record.id(), id);
        assert_eq!(record.balance(), Decimal::new(100, 0));
    }

    #[test]
    fn test_lookup_unknown_id_fails() {
        let registry = AccountRegistry::new();
        registry.create(money(1)).unwrap();

        let unknown = AccountId::generate();
        let result = registry.lookup(unknown);

        assert_eq!(result.unwrap_err(), LedgerError::AccountNotFound { id: unknown });
    }

    #[test]
    fn test_lookup_returns_same_record() {
        let registry = AccountRegistry::new();
        let id = registry.create(money(5)).unwrap();

        let first = registry.lookup(id).unwrap();
        let second = registry.lookup(id).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_insert_collision_keeps_existing_record() {
        let registry = AccountRegistry::new();
        let id = AccountId::generate();
        registry.insert(id, money(10)).unwrap();

        let result = registry.insert(id, money(99));

        assert_eq!(result, Err(LedgerError::AccountIdCollision { id }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(id).unwrap().balance(), Decimal::new(10, 0));
    }

    #[test]
    fn test_empty_registry() {
        let registry = AccountRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.ids().is_empty());
    }

    #[test]
    fn test_ids_lists_every_account() {
        let registry = AccountRegistry::new();
        let a = registry.create(money(1)).unwrap();
        let b = registry.create(money(2)).unwrap();

        let ids = registry.ids();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
        assert_eq!(registry.records().len(), 2);
    }

    #[test]
    fn test_concurrent_create_and_lookup() {
        let registry = Arc::new(AccountRegistry::new());
        let mut handles = vec![];

        for i in 1..=32 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let id = registry.create(money(i)).unwrap();
                let record = registry.lookup(id).unwrap();
                assert_eq!(record.balance(), Decimal::new(i, 0));
                id
            }));
        }

        let ids: Vec<AccountId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 32);
        for id in ids {
            assert!(registry.contains(id));
        }
    }

    #[test]
    fn test_lookup_does_not_wait_on_account_lock() {
        let registry = AccountRegistry::new();
        let id = registry.create(money(1)).unwrap();
        let record = registry.lookup(id).unwrap();

        let _guard = record.lock();

        // Lookup must succeed while the account lock is held.
        assert!(registry.lookup(id).is_ok());
    }
}
