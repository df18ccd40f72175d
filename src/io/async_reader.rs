//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over ledger commands from a CSV script,
//! read in batches for the concurrent replay strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures' `AsyncRead` so any async source works (tokio files via `compat`)
//!
//! Invalid records are returned as `Err` items in the batch, like
//! `SyncReader` yields them; they never end a batch early.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{LedgerCommand, ScriptError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader over ledger commands
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    records_read: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            records_read: 0,
        }
    }

    /// Read a batch of records
    ///
    /// Reads up to `batch_size` records. Each one is either a parsed command
    /// or the error that made it unusable.
    ///
    /// # Returns
    ///
    /// A vector of outcomes in file order; empty once the script is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Result<LedgerCommand, ScriptError>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let next = match records.next().await {
                Some(next) => next,
                None => break,
            };

            self.records_read += 1;
            let line = self.records_read + 1;

            batch.push(match next {
                Ok(csv_record) => convert_csv_record(csv_record, Some(line)),
                Err(e) => Err(ScriptError::from(e)),
            });
        }

        batch
    }
}
