//! Concurrent batch replay strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Commands are read in batches and the non-`open`
//! commands of each batch are applied concurrently from several worker
//! threads against one shared `LedgerEngine`.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, workers)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── AccountDirectory (labels -> ids, driver task only)
//!     └── BatchProcessor (round-robin fan-out to blocking workers)
//!         └── Arc<LedgerEngine>
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another; a batch finishes completely
//!   before the next one is read.
//! - Within a batch, `open` commands are applied first, in file order, on the
//!   driver task. The remaining commands then run concurrently, so their
//!   relative order is not preserved. Scripts whose outcome depends on that
//!   order (e.g. a withdrawal that only succeeds after a deposit in the same
//!   batch) may end differently than under the sync strategy.

use crate::core::{BatchProcessor, LedgerEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_balances_csv;
use crate::strategy::{AccountDirectory, ProcessingStrategy, ReplaySummary};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of worker threads applying a batch
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            workers: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, workers: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let workers = if workers == 0 {
            warn!(workers, default = default.workers, "invalid workers, using default");
            default.workers
        } else {
            workers
        };

        Self {
            batch_size,
            workers,
        }
    }
}

/// Concurrent batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplaySummary, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.workers.max(1))
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let engine = Arc::new(LedgerEngine::new());
            let processor =
                BatchProcessor::new(Arc::clone(&engine), self.config.workers);
            let mut directory = AccountDirectory::new();
            let mut summary = ReplaySummary::default();

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let mut staged = Vec::with_capacity(batch.len());
                for parsed in batch {
                    let staged_command =
                        parsed.and_then(|command| directory.stage(engine.as_ref(), command));
                    match staged_command {
                        Ok(Some(operation)) => staged.push(operation),
                        Ok(None) => summary.applied += 1,
                        Err(e) => {
                            warn!(error = %e, "command rejected");
                            summary.rejected += 1;
                        }
                    }
                }

                for outcome in processor.process_batch(staged).await? {
                    if let Err(e) = &outcome.result {
                        warn!(error = %e, operation = ?outcome.operation, "command rejected");
                    }
                    summary.record(&outcome.result);
                }
            }

            let rows = directory
                .balances(engine.as_ref())
                .map_err(|e| format!("Failed to read balances: {}", e))?;
            write_balances_csv(&rows, output)?;

            info!(
                applied = summary.applied,
                rejected = summary.rejected,
                accounts = rows.len(),
                "replay finished"
            );

            Ok(summary)
        })
    }
}
