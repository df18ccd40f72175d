//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - The `Ledger` operation set
//! - `account_record` - Per-account balance and lock
//! - `registry` - Concurrent id -> record mapping
//! - `engine` - Locking protocol for deposits, withdrawals and transfers
//! - `batch_processor` - Concurrent fan-out of resolved script operations

pub mod account_record;
pub mod batch_processor;
pub mod engine;
pub mod registry;
pub mod traits;

pub use account_record::AccountRecord;
pub use batch_processor::{apply_operation, BatchProcessor, ProcessingResult};
pub use engine::LedgerEngine;
pub use registry::AccountRegistry;
pub use traits::Ledger;
