//! Ledger script commands
//!
//! A ledger script names accounts by script-local labels. Commands are parsed
//! with labels and resolved to [`AccountId`]s just before they are applied.

use super::account::AccountId;
use super::money::Money;
use serde::{Deserialize, Serialize};

/// Script-local account label
pub type AccountLabel = String;

/// Operation kinds supported in a ledger script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Create an account with an initial deposit
    Open,

    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account; requires sufficient balance
    Withdraw,

    /// Move funds between two distinct accounts
    Transfer,
}

/// A parsed script command, still addressed by label
///
/// `counterparty` is only set for transfers, where it names the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCommand {
    /// The operation to perform
    pub op: OperationType,

    /// The account the operation applies to (source for transfers)
    pub account: AccountLabel,

    /// Destination account of a transfer
    pub counterparty: Option<AccountLabel>,

    /// Validated positive amount
    pub amount: Money,
}

/// A command whose labels have been resolved to account identifiers
///
/// `open` commands never become a `ResolvedOperation`: they are applied while
/// resolving, since they create the identifier the label maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedOperation {
    Deposit { id: AccountId, amount: Money },
    Withdraw { id: AccountId, amount: Money },
    Transfer { from: AccountId, to: AccountId, amount: Money },
}
