//! Account-related types for the ledger
//!
//! This module defines the opaque account identifier and the read-only
//! balance snapshot handed out to callers. The mutable account state lives in
//! [`crate::core::AccountRecord`] and is never exposed directly.

use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Opaque account identifier
///
/// A random (v4) UUID generated when the account is created. Identifiers are
/// compared by the UUID's byte order, which gives a stable total order across
/// the whole process; the engine relies on that order to acquire account
/// locks deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        AccountId(Uuid::new_v4())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        AccountId(uuid)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Point-in-time balance of a single account
///
/// Each snapshot is read under its account's lock, so the balance is never
/// observed mid-mutation. Snapshots of several accounts taken one after
/// another are not a consistent cut across accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    /// The account identifier
    pub id: AccountId,

    /// Balance at the time the account's lock was held
    pub balance: Decimal,
}
