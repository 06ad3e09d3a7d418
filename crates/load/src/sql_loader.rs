//! Multi-row INSERT batching

use crate::BatchLoader;
use std::fmt::Write;
use std::thread;
use std::time::Duration;
use tpcc_core::{Error, Result};
use tpcc_sql::{Connection, SqlValue};
use tracing::warn;

/// Rows per INSERT statement
pub const MAX_BATCH_COUNT: usize = 1024;

/// Append a SQL literal for `value` to `buf`
pub fn render_literal(buf: &mut String, value: &SqlValue) {
    match value {
        SqlValue::Null => buf.push_str("NULL"),
        SqlValue::Int(v) => {
            let _ = write!(buf, "{}", v);
        }
        SqlValue::Float(v) => {
            let _ = write!(buf, "{:.6}", v);
        }
        SqlValue::Text(s) => {
            buf.push('\'');
            for ch in s.chars() {
                if ch == '\'' {
                    buf.push('\'');
                }
                buf.push(ch);
            }
            buf.push('\'');
        }
    }
}

/// Buffers rows into `INSERT ... VALUES (...),(...)` statements
pub struct SqlBatchLoader<'c> {
    conn: &'c mut dyn Connection,
    insert_hint: String,
    buf: String,
    count: usize,
    retry_count: u32,
    retry_interval: Duration,
}

impl<'c> SqlBatchLoader<'c> {
    /// Loader for one table; `insert_hint` is the `INSERT INTO t (cols) VALUES `
    /// prefix each statement starts with
    pub fn new(conn: &'c mut dyn Connection, insert_hint: impl Into<String>) -> Self {
        Self {
            conn,
            insert_hint: insert_hint.into(),
            buf: String::new(),
            count: 0,
            retry_count: 0,
            retry_interval: Duration::ZERO,
        }
    }

    /// Retry a failed statement `count` times, pausing `interval` between tries
    pub fn with_retry(mut self, count: u32, interval: Duration) -> Self {
        self.retry_count = count;
        self.retry_interval = interval;
        self
    }

    /// Rows buffered but not yet sent
    pub fn pending(&self) -> usize {
        self.count
    }
}

impl BatchLoader for SqlBatchLoader<'_> {
    fn insert_value(&mut self, row: &[SqlValue]) -> Result<()> {
        if self.count == 0 {
            self.buf.push_str(&self.insert_hint);
        } else {
            self.buf.push(',');
        }
        self.buf.push('(');
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            render_literal(&mut self.buf, value);
        }
        self.buf.push(')');
        self.count += 1;

        if self.count >= MAX_BATCH_COUNT {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.count == 0 {
            return Ok(());
        }
        let mut attempt = 0;
        loop {
            match self.conn.execute_sql(&self.buf, &[]) {
                Ok(_) => break,
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(
                        target: "tpcc::load",
                        error = %e,
                        attempt,
                        rows = self.count,
                        "Bulk insert failed, retrying"
                    );
                    thread::sleep(self.retry_interval);
                }
                Err(source) => {
                    return Err(Error::Sql {
                        query: self.insert_hint.trim_end().to_string(),
                        source,
                    })
                }
            }
        }
        self.buf.clear();
        self.count = 0;
        Ok(())
    }
}
