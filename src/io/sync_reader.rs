//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over ledger commands from a CSV script.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize records one at a
//! time, so memory use does not grow with the script length.
//!
//! ```no_run
//! use ledger_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("script.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("{:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Individual record errors are yielded as Err variants in the iterator

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{LedgerCommand, ScriptError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Synchronous CSV reader over ledger commands
#[derive(Debug)]
pub struct SyncReader<R: Read = File> {
    reader: csv::Reader<R>,
    records_read: u64,
}

impl SyncReader<File> {
    /// Open a CSV script for streaming iteration
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(String)` if the file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        Ok(Self::from_reader(file))
    }
}

impl<R: Read> SyncReader<R> {
    /// Wrap any reader producing CSV script data
    ///
    /// The CSV reader trims whitespace, allows a short final column, and
    /// uses an 8KB buffer.
    pub fn from_reader(source: R) -> Self {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(source);

        Self {
            reader,
            records_read: 0,
        }
    }
}

impl<R: Read> Iterator for SyncReader<R> {
    type Item = Result<LedgerCommand, ScriptError>;

    /// Get the next command from the script
    ///
    /// # Returns
    ///
    /// * `Some(Ok(LedgerCommand))` - Successfully parsed command
    /// * `Some(Err(ScriptError))` - Parse or validation error
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let next = deserializer.next()?;

        self.records_read += 1;
        // Header occupies line 1.
        let line = Some(self.records_read + 1);

        Some(match next {
            Ok(csv_record) => convert_csv_record(csv_record, line),
            Err(e) => Err(ScriptError::from(e)),
        })
    }
}
