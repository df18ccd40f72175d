//! Replay strategy module
//!
//! This module defines the Strategy pattern for replaying a ledger script:
//! reading commands, applying them to a fresh `LedgerEngine`, and writing the
//! final balances. Different implementations (sequential, concurrent batch)
//! can be selected at runtime.

use crate::cli::StrategyType;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod directory;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use directory::AccountDirectory;
pub use sync::SyncProcessingStrategy;

/// Outcome counts of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Commands the ledger accepted
    pub applied: usize,

    /// Records skipped: malformed, unresolvable, or rejected by the ledger
    pub rejected: usize,
}

impl ReplaySummary {
    /// Count one outcome
    pub fn record<T, E>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// Replay strategy trait
///
/// Each strategy reads a CSV script, applies it to its own fresh ledger, and
/// writes the final balances to `output`.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` and write balances to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` if the replay completed (individual records may
    ///   have been rejected; they are logged and counted)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error,
    ///   output not writable)
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, String>;
}

/// Create a replay strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sequential (Sync) or concurrent batch (Async)
/// * `config` - Batch configuration for Async; ignored for Sync
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_outcomes() {
        let mut summary = ReplaySummary::default();

        summary.record::<(), ()>(&Ok(()));
        summary.record::<(), ()>(&Ok(()));
        summary.record::<(), &str>(&Err("no"));

        assert_eq!(summary, ReplaySummary { applied: 2, rejected: 1 });
    }
}
