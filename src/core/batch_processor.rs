//! Concurrent fan-out of resolved ledger operations
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! already-resolved operations to a shared ledger from several worker threads
//! at once.
//!
//! # Design
//!
//! A batch is split round-robin into one partition per worker. Each partition
//! runs on a tokio blocking thread (account locks block the calling thread, so
//! the work does not belong on the async executor). Partitions apply their
//! operations in order; operations in different partitions interleave freely
//! and contend on account locks exactly as independent callers would.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<dyn Ledger>   (shared ledger, usually a LedgerEngine)
//!     └── workers           (partitions per batch)
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tracing::error;

use super::Ledger;
use crate::types::{LedgerError, ResolvedOperation};

/// Result of applying a single operation
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: ResolvedOperation,

    /// The outcome (success or the ledger's error)
    pub result: Result<(), LedgerError>,
}

/// Apply one resolved operation to a ledger
pub fn apply_operation<L: Ledger + ?Sized>(
    ledger: &L,
    operation: ResolvedOperation,
) -> Result<(), LedgerError> {
    match operation {
        ResolvedOperation::Deposit { id, amount } => ledger.deposit(id, amount),
        ResolvedOperation::Withdraw { id, amount } => ledger.withdraw(id, amount),
        ResolvedOperation::Transfer { from, to, amount } => ledger.transfer(from, to, amount),
    }
}

/// Batch processor with round-robin partitioning across worker threads
#[derive(Clone)]
pub struct BatchProcessor {
    /// Shared ledger the operations are applied to
    ledger: Arc<dyn Ledger>,

    /// Number of partitions per batch (at least 1)
    workers: usize,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `ledger` - Shared ledger to apply operations to
    /// * `workers` - Partitions per batch; 0 is treated as 1
    pub fn new<L: Ledger + 'static>(ledger: Arc<L>, workers: usize) -> Self {
        let ledger: Arc<dyn Ledger> = ledger;
        Self {
            ledger,
            workers: workers.max(1),
        }
    }

    /// Number of partitions each batch is split into
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Split a batch round-robin into at most `workers` partitions
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one partition
    /// - Within a partition, operations keep their relative batch order
    /// - No partition is empty
    pub fn partition(&self, batch: Vec<ResolvedOperation>) -> Vec<Vec<ResolvedOperation>> {
        let count = self.workers.min(batch.len());
        let mut partitions: Vec<Vec<ResolvedOperation>> = (0..count)
            .map(|_| Vec::with_capacity(batch.len() / count.max(1) + 1))
            .collect();

        for (index, operation) in batch.into_iter().enumerate() {
            partitions[index % count].push(operation);
        }

        partitions
    }

    /// Apply a partition sequentially on the calling thread
    ///
    /// Every operation is attempted; failures are captured in the results.
    pub fn process_partition(&self, operations: Vec<ResolvedOperation>) -> Vec<ProcessingResult> {
        operations
            .into_iter()
            .map(|operation| ProcessingResult {
                operation,
                result: apply_operation(self.ledger.as_ref(), operation),
            })
            .collect()
    }

    /// Apply a batch concurrently and wait for every operation to finish
    ///
    /// Must be called from within a tokio runtime. Results are grouped by
    /// partition, not in batch order.
    ///
    /// # Returns
    ///
    /// * `Ok(results)` - One result per operation in the batch
    /// * `Err(String)` - A worker died; its partition's outcomes are unknown
    pub async fn process_batch(
        &self,
        batch: Vec<ResolvedOperation>,
    ) -> Result<Vec<ProcessingResult>, String> {
        let tasks = self.partition(batch).into_iter().map(|operations| {
            let processor = self.clone();
            tokio::task::spawn_blocking(move || processor.process_partition(operations))
        });

        let mut results = Vec::new();
        let mut failed_workers = 0usize;
        for joined in join_all(tasks).await {
            match joined {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => {
                    error!(error = %e, "worker task failed");
                    failed_workers += 1;
                }
            }
        }

        if failed_workers > 0 {
            return Err(format!("{} worker task(s) failed while applying a batch", failed_workers));
        }

        Ok(results)
    }
}
