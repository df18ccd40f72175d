//! Sequential replay strategy
//!
//! Streams the script with `SyncReader` and applies each command on the
//! calling thread, in file order. Results are deterministic for a given
//! script.

use crate::core::{apply_operation, LedgerEngine};
use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{AccountDirectory, ProcessingStrategy, ReplaySummary};
use crate::types::ScriptError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Sequential replay strategy
///
/// # Examples
///
/// ```no_run
/// use ledger_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let mut output = std::io::stdout();
/// SyncProcessingStrategy
///     .process(Path::new("script.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, String> {
        let engine = LedgerEngine::new();
        let mut directory = AccountDirectory::new();
        let mut summary = ReplaySummary::default();

        let reader = SyncReader::new(input_path)?;

        for parsed in reader {
            let result = parsed.and_then(|command| {
                match directory.stage(&engine, command)? {
                    Some(operation) => apply_operation(&engine, operation).map_err(ScriptError::from),
                    None => Ok(()),
                }
            });

            if let Err(e) = &result {
                warn!(error = %e, "command rejected");
            }
            summary.record(&result);
        }

        let rows = directory
            .balances(&engine)
            .map_err(|e| format!("Failed to read balances: {}", e))?;
        write_balances_csv(&rows, output)?;

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            accounts = rows.len(),
            "replay finished"
        );

        Ok(summary)
    }
}
