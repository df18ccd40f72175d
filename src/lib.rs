//! Concurrent In-Memory Ledger
//! # Overview
//!
//! This library manages monetary accounts in memory: creation, deposits,
//! withdrawals, and atomic transfers, safe under concurrent use from many
//! threads. A CSV script replayer is included for driving the ledger from the
//! command line.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Money, AccountId, errors, script commands)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - The locking protocol for every balance mutation
//!   - [`core::registry`] - Concurrent id -> account record mapping
//!   - [`core::account_record`] - Balance guarded by a per-account mutex
//!   - [`core::batch_processor`] - Concurrent fan-out used by the async replay
//! - [`io`] - CSV script parsing and balance output
//! - [`strategy`] - Sequential and concurrent script replay
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - tracing subscriber setup
//!
//! # Guarantees
//!
//! - No balance is ever negative.
//! - Every operation is all-or-nothing; failures leave balances untouched.
//! - Transfers lock both accounts in ascending id order, so concurrent
//!   transfers in any direction, including cycles across many accounts,
//!   cannot deadlock.
//!
//! ```
//! use ledger_engine::{LedgerEngine, LedgerError, Money};
//! use rust_decimal::Decimal;
//!
//! let engine = LedgerEngine::new();
//! let a = engine.create_account(Money::new(Decimal::new(200, 0))?)?;
//! let b = engine.create_account(Money::new(Decimal::new(50, 0))?)?;
//!
//! engine.transfer(a, b, Money::new(Decimal::new(70, 0))?)?;
//!
//! assert_eq!(engine.balance(a)?, Decimal::new(130, 0));
//! assert_eq!(engine.balance(b)?, Decimal::new(120, 0));
//! # Ok::<(), LedgerError>(())
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use self::core::{AccountRegistry, Ledger, LedgerEngine};
pub use io::write_balances_csv;
pub use types::{AccountId, AccountSnapshot, LedgerError, Money, ScriptError};
