//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `money`: Validated positive amounts
//! - `account`: Account identifiers and balance snapshots
//! - `command`: Ledger script commands
//! - `error`: Error types for the ledger

pub mod account;
pub mod command;
pub mod error;
pub mod money;

pub use account::{AccountId, AccountSnapshot};
pub use command::{AccountLabel, LedgerCommand, OperationType, ResolvedOperation};
pub use error::{LedgerError, ScriptError};
pub use money::Money;
