//! SQLite backend
//!
//! Each `SqliteConnection` wraps one `rusqlite::Connection` opened on a database
//! file in WAL mode. Writers serialize on SQLite's database lock, so read-write
//! transactions start with `BEGIN IMMEDIATE` and rely on the busy timeout
//! instead of failing on upgrade. SQLite is always serializable; the requested
//! isolation level is accepted and ignored.

use crate::connection::{
    next_generation, Connection, Connector, Statement, StatementRegistry, TxOptions,
};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::{Row, SqlValue};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, ToSql};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default time a writer waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Prepared statements kept per connection. The transaction mix prepares
/// 11 item-count variants for three NewOrder statements plus about thirty
/// fixed statements.
const STATEMENT_CACHE_CAPACITY: usize = 256;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Int(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Float(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Int(v),
        ValueRef::Real(v) => SqlValue::Float(v),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            SqlValue::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}

fn driver(e: rusqlite::Error) -> Error {
    Error::driver(e)
}

fn collect_rows(stmt: &mut rusqlite::Statement<'_>, params: &[SqlValue]) -> Result<Vec<Row>> {
    let columns = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(params.iter())).map_err(driver)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(driver)? {
        let mut values = Vec::with_capacity(columns);
        for i in 0..columns {
            values.push(from_value_ref(row.get_ref(i).map_err(driver)?));
        }
        out.push(Row::new(values));
    }
    Ok(out)
}

// ============================================================================
// Connector
// ============================================================================

/// Opens SQLite connections on one database file
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    /// Connector for the database file at `path` (created on first connect)
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Override how long writers wait on a locked database
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a concrete connection
    pub fn open_connection(&self) -> Result<SqliteConnection> {
        let conn = rusqlite::Connection::open(&self.path).map_err(driver)?;
        conn.busy_timeout(self.busy_timeout).map_err(driver)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(driver)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(driver)?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);

        let generation = next_generation();
        debug!(
            target: "tpcc::sql",
            path = ?self.path,
            journal_mode = %mode,
            generation,
            "Opened SQLite connection"
        );
        Ok(SqliteConnection {
            conn,
            statements: StatementRegistry::new(generation),
        })
    }
}

impl Connector for SqliteConnector {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(self.open_connection()?))
    }
}

// ============================================================================
// Connection
// ============================================================================

/// One SQLite session
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    statements: StatementRegistry,
}

impl SqliteConnection {
    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl Connection for SqliteConnection {
    fn generation(&self) -> u64 {
        self.statements.generation()
    }

    fn ping(&mut self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(driver)
    }

    fn begin(&mut self, opts: TxOptions) -> Result<()> {
        if self.in_transaction() {
            return Err(Error::TransactionActive);
        }
        let sql = if opts.read_only {
            "BEGIN DEFERRED"
        } else {
            "BEGIN IMMEDIATE"
        };
        self.conn.execute_batch(sql).map_err(driver)
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(Error::NoTransaction);
        }
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            // A failed COMMIT leaves the transaction open
            if self.in_transaction() {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
            return Err(driver(e));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(Error::NoTransaction);
        }
        self.conn.execute_batch("ROLLBACK").map_err(driver)
    }

    fn prepare(&mut self, sql: &str) -> Result<Statement> {
        // Compile now so syntax errors surface at prepare time
        self.conn.prepare_cached(sql).map_err(driver)?;
        Ok(self.statements.register(sql))
    }

    fn execute(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<u64> {
        let sql = self.statements.resolve(stmt)?;
        let mut prepared = self.conn.prepare_cached(sql).map_err(driver)?;
        let affected = prepared
            .execute(params_from_iter(params.iter()))
            .map_err(driver)?;
        Ok(affected as u64)
    }

    fn query(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<Vec<Row>> {
        let sql = self.statements.resolve(stmt)?;
        let mut prepared = self.conn.prepare_cached(sql).map_err(driver)?;
        collect_rows(&mut prepared, params)
    }

    fn execute_sql(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let affected = self
            .conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(driver)?;
        Ok(affected as u64)
    }

    fn query_sql(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let mut prepared = self.conn.prepare(sql).map_err(driver)?;
        collect_rows(&mut prepared, params)
    }

    fn close_statements(&mut self) {
        self.conn.flush_prepared_statement_cache();
        self.statements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::IsolationLevel;
    use crate::transaction::Transaction;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteConnector, Box<dyn Connection>) {
        let dir = TempDir::new().unwrap();
        let connector = SqliteConnector::open(dir.path().join("test.db"));
        let mut conn = connector.connect().unwrap();
        conn.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, v DECIMAL(6,2), s VARCHAR(10))", &[])
            .unwrap();
        (dir, connector, conn)
    }

    fn count(conn: &mut dyn Connection) -> i64 {
        conn.query_sql("SELECT COUNT(*) FROM t", &[]).unwrap()[0]
            .get_i64(0)
            .unwrap()
    }

    #[test]
    fn test_prepared_round_trip() {
        let (_dir, _connector, mut conn) = setup();
        let insert = conn.prepare("INSERT INTO t (id, v, s) VALUES (?, ?, ?)").unwrap();
        let select = conn.prepare("SELECT id, v, s FROM t WHERE id = ?").unwrap();

        let affected = conn
            .execute(&insert, &[1i64.into(), 12.5.into(), "abc".into()])
            .unwrap();
        assert_eq!(affected, 1);

        let rows = conn.query(&select, &[1i64.into()]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64(0).unwrap(), 1);
        assert_eq!(rows[0].get_f64(1).unwrap(), 12.5);
        assert_eq!(rows[0].get_str(2).unwrap(), "abc");
    }

    #[test]
    fn test_null_parameters() {
        let (_dir, _connector, mut conn) = setup();
        conn.execute_sql(
            "INSERT INTO t (id, v, s) VALUES (?, ?, ?)",
            &[2i64.into(), SqlValue::Null, SqlValue::Null],
        )
        .unwrap();
        let rows = conn.query_sql("SELECT v, s FROM t", &[]).unwrap();
        assert!(rows[0].is_null(0));
        assert!(rows[0].is_null(1));
    }

    #[test]
    fn test_commit_and_rollback() {
        let (_dir, _connector, mut conn) = setup();
        let opts = TxOptions::read_write(IsolationLevel::Default);

        conn.begin(opts).unwrap();
        conn.execute_sql("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        conn.rollback().unwrap();
        assert_eq!(count(conn.as_mut()), 0);

        conn.begin(opts).unwrap();
        conn.execute_sql("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        conn.commit().unwrap();
        assert_eq!(count(conn.as_mut()), 1);

        assert_eq!(conn.commit(), Err(Error::NoTransaction));
    }

    #[test]
    fn test_nested_begin_rejected() {
        let (_dir, _connector, mut conn) = setup();
        conn.begin(TxOptions::default()).unwrap();
        assert_eq!(conn.begin(TxOptions::default()), Err(Error::TransactionActive));
        conn.rollback().unwrap();
    }

    #[test]
    fn test_transaction_guard_rolls_back_on_drop() {
        let (_dir, _connector, mut conn) = setup();
        let insert = conn.prepare("INSERT INTO t (id) VALUES (?)").unwrap();
        {
            let mut tx = Transaction::begin(conn.as_mut(), TxOptions::default()).unwrap();
            tx.execute(&insert, &[7i64.into()]).unwrap();
        }
        assert_eq!(count(conn.as_mut()), 0);

        let mut tx = Transaction::begin(conn.as_mut(), TxOptions::default()).unwrap();
        tx.execute(&insert, &[7i64.into()]).unwrap();
        tx.commit().unwrap();
        assert_eq!(count(conn.as_mut()), 1);
    }

    #[test]
    fn test_statement_from_other_connection_is_stale() {
        let (_dir, connector, mut conn) = setup();
        let stmt = conn.prepare("SELECT COUNT(*) FROM t").unwrap();
        let mut other = connector.connect().unwrap();
        assert_ne!(conn.generation(), other.generation());
        assert!(matches!(
            other.query(&stmt, &[]),
            Err(Error::StaleStatement { .. })
        ));
    }

    #[test]
    fn test_close_statements_invalidates_handles() {
        let (_dir, _connector, mut conn) = setup();
        let stmt = conn.prepare("SELECT COUNT(*) FROM t").unwrap();
        conn.close_statements();
        assert_eq!(conn.query(&stmt, &[]), Err(Error::UnknownStatement(0)));
    }

    #[test]
    fn test_prepare_reports_syntax_errors() {
        let (_dir, _connector, mut conn) = setup();
        assert!(matches!(
            conn.prepare("SELEC nonsense"),
            Err(Error::Driver { .. })
        ));
        conn.ping().unwrap();
    }

    #[test]
    fn test_writes_visible_across_connections() {
        let (_dir, connector, mut conn) = setup();
        conn.execute_sql("INSERT INTO t (id) VALUES (1)", &[]).unwrap();
        let mut other = connector.connect().unwrap();
        assert_eq!(count(other.as_mut()), 1);
    }
}
