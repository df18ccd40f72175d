//! Per-account state and its lock
//!
//! An `AccountRecord` owns a balance behind its own mutex. The mutex is the
//! only path to the balance: reads and writes both go through a guard, and
//! the guard-returning method is crate-private so that only the engine can
//! hold it across a check-and-update.

use crate::types::{AccountId, AccountSnapshot, Money};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;

/// Mutable account state, the unit of concurrency control
///
/// No two records share a lock. Records are created once by the registry and
/// live as long as it does.
#[derive(Debug)]
pub struct AccountRecord {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl AccountRecord {
    pub(crate) fn new(id: AccountId, initial: Money) -> Self {
        Self {
            id,
            balance: Mutex::new(initial.amount()),
        }
    }

    /// The identifier this record is registered under
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Current balance, read under the account's lock
    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }

    /// Snapshot of id and balance, read under the account's lock
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            balance: self.balance(),
        }
    }

    /// Acquire the account's lock
    ///
    /// Blocks until the lock is free. Callers taking two locks must do so in
    /// ascending `id()` order.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Decimal> {
        self.balance.lock()
    }
}
