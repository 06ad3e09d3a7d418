//! Bulk row sinks used while loading the initial dataset
//!
//! Row generators push rows one at a time into a `BatchLoader`:
//! - `SqlBatchLoader` buffers rows into multi-row INSERT statements
//! - `CsvBatchLoader` appends rows to a CSV file
//!
//! Callers must `flush` after the last row of a table.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod csv_loader;
mod sql_loader;

pub use csv_loader::CsvBatchLoader;
pub use sql_loader::{render_literal, SqlBatchLoader, MAX_BATCH_COUNT};

use tpcc_core::Result;
use tpcc_sql::SqlValue;

/// Destination for generated rows
pub trait BatchLoader {
    /// Append one row
    fn insert_value(&mut self, row: &[SqlValue]) -> Result<()>;

    /// Write out everything buffered so far
    fn flush(&mut self) -> Result<()>;

    /// Flush and release resources
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}
