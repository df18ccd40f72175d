//! Error types for the ledger
//!
//! This module defines the failures an engine operation can report, plus the
//! errors raised while replaying a ledger script from CSV.
//!
//! # Error Categories
//!
//! - **Validation**: non-positive amounts, self-transfers
//! - **Lookup**: unknown account identifiers
//! - **Business rules**: insufficient funds
//! - **Arithmetic**: decimal overflow while applying a balance change
//! - **Script**: malformed CSV records, unknown or duplicate account labels

use super::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error type for ledger operations
///
/// Every variant carries the data needed to build a meaningful message. None
/// of them leave partial state behind: an operation that fails has not
/// touched any balance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero or negative
    ///
    /// Raised by the `Money` constructor, before any account is looked up.
    #[error("Amount must be greater than 0, got {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// No account is registered under the identifier
    #[error("Account not found: {id}")]
    AccountNotFound {
        /// The unknown identifier
        id: AccountId,
    },

    /// Debit exceeds the current balance
    ///
    /// Checked under the account's lock before any write, so the balance
    /// reported here is the one the decision was made on.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the moment of the check
        balance: Decimal,
        /// Amount the caller tried to debit
        requested: Decimal,
    },

    /// Source and destination of a transfer are the same account
    #[error("Cannot transfer from account {id} to itself")]
    SelfTransfer {
        /// The account named on both sides
        id: AccountId,
    },

    /// A freshly generated identifier was already registered
    ///
    /// Practically unreachable with random 122-bit identifiers.
    #[error("Account identifier collision: {id}")]
    AccountIdCollision {
        /// The colliding identifier
        id: AccountId,
    },

    /// Applying the change would exceed the decimal range
    #[error("Arithmetic overflow in {operation} for account {id}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account whose balance would overflow
        id: AccountId,
    },
}

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(id: AccountId) -> Self {
        LedgerError::AccountNotFound { id }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds { balance, requested }
    }

    /// Create a SelfTransfer error
    pub fn self_transfer(id: AccountId) -> Self {
        LedgerError::SelfTransfer { id }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, id: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            id,
        }
    }
}

/// Error raised while replaying a ledger script
///
/// Script errors are per-record: the offending command is skipped and the
/// replay continues with the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The CSV record could not be parsed into a command
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the problem
        message: String,
    },

    /// The script references a label that was never opened
    #[error("Unknown account '{label}'")]
    UnknownAccount {
        /// The unknown label
        label: String,
    },

    /// The script opens a label that is already in use
    #[error("Account '{label}' is already open")]
    DuplicateAccount {
        /// The duplicated label
        label: String,
    },

    /// The ledger rejected the command
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ScriptError {
    /// Create a Parse error
    pub fn parse(line: Option<u64>, message: impl Into<String>) -> Self {
        ScriptError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an UnknownAccount error
    pub fn unknown_account(label: &str) -> Self {
        ScriptError::UnknownAccount {
            label: label.to_string(),
        }
    }

    /// Create a DuplicateAccount error
    pub fn duplicate_account(label: &str) -> Self {
        ScriptError::DuplicateAccount {
            label: label.to_string(),
        }
    }
}

impl From<csv::Error> for ScriptError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        ScriptError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for ScriptError {
    fn from(error: csv_async::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        ScriptError::Parse {
            line,
            message: error.to_string(),
        }
    }
}
