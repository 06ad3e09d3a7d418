//! CSV file output

use crate::BatchLoader;
use std::fs::File;
use std::path::{Path, PathBuf};
use tpcc_core::Result;
use tpcc_sql::SqlValue;
use tracing::debug;

/// Writes rows to one CSV file, no header, NULL spelled as `NULL`
pub struct CsvBatchLoader {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: u64,
}

fn render_field(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::Float(v) => format!("{:.6}", v),
        SqlValue::Text(s) => s.clone(),
    }
}

impl CsvBatchLoader {
    /// Create (or truncate) the file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl BatchLoader for CsvBatchLoader {
    fn insert_value(&mut self, row: &[SqlValue]) -> Result<()> {
        self.writer.write_record(row.iter().map(render_field))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        debug!(target: "tpcc::load", path = ?self.path, rows = self.rows, "Closed CSV output");
        Ok(())
    }
}
