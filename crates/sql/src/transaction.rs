//! RAII transaction guard
//!
//! Every exit path that does not reach `commit` rolls the transaction back,
//! including early returns through `?`.

use crate::connection::{Connection, Statement, TxOptions};
use crate::error::Result;
use crate::value::{Row, SqlValue};
use tracing::warn;

/// An open transaction on a borrowed connection
pub struct Transaction<'c> {
    conn: &'c mut dyn Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    /// Begin a transaction
    pub fn begin(conn: &'c mut dyn Connection, opts: TxOptions) -> Result<Self> {
        conn.begin(opts)?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Run a prepared statement that returns no rows
    pub fn execute(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<u64> {
        self.conn.execute(stmt, params)
    }

    /// Run a prepared statement that returns rows
    pub fn query(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.conn.query(stmt, params)
    }

    /// Commit and consume the guard
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.conn.commit()
    }

    /// Roll back and consume the guard
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.rollback()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.rollback() {
            warn!(target: "tpcc::sql", error = %e, "Rollback of abandoned transaction failed");
        }
    }
}
