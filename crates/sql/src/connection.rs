//! Connection and connector traits
//!
//! Prepared statements are bound to the connection that prepared them. Every
//! connection carries a process-unique generation number, and a `Statement`
//! remembers the generation it was prepared on, so using a statement after a
//! reconnect fails with `Error::StaleStatement` instead of silently running
//! on the wrong session.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::{Row, SqlValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique connection generation
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Transaction options
// ============================================================================

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Driver default
    #[default]
    Default,
    /// READ UNCOMMITTED
    ReadUncommitted,
    /// READ COMMITTED
    ReadCommitted,
    /// WRITE COMMITTED
    WriteCommitted,
    /// REPEATABLE READ
    RepeatableRead,
    /// SNAPSHOT
    Snapshot,
    /// SERIALIZABLE
    Serializable,
    /// LINEARIZABLE
    Linearizable,
}

impl IsolationLevel {
    /// Map the numeric level used by command-line front ends (0..=7)
    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            0 => IsolationLevel::Default,
            1 => IsolationLevel::ReadUncommitted,
            2 => IsolationLevel::ReadCommitted,
            3 => IsolationLevel::WriteCommitted,
            4 => IsolationLevel::RepeatableRead,
            5 => IsolationLevel::Snapshot,
            6 => IsolationLevel::Serializable,
            7 => IsolationLevel::Linearizable,
            _ => return None,
        })
    }

    /// SQL spelling for `SET TRANSACTION ISOLATION LEVEL`, if any
    pub fn sql_name(self) -> Option<&'static str> {
        match self {
            IsolationLevel::Default => None,
            IsolationLevel::ReadUncommitted => Some("READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => Some("READ COMMITTED"),
            IsolationLevel::WriteCommitted => Some("WRITE COMMITTED"),
            IsolationLevel::RepeatableRead => Some("REPEATABLE READ"),
            IsolationLevel::Snapshot => Some("SNAPSHOT"),
            IsolationLevel::Serializable => Some("SERIALIZABLE"),
            IsolationLevel::Linearizable => Some("LINEARIZABLE"),
        }
    }
}

/// Options passed to `Connection::begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    /// Requested isolation level
    pub isolation: IsolationLevel,
    /// Whether the transaction only reads
    pub read_only: bool,
}

impl TxOptions {
    /// Read-write transaction at the given isolation level
    pub fn read_write(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            read_only: false,
        }
    }

    /// Read-only transaction at the given isolation level
    pub fn read_only(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            read_only: true,
        }
    }
}

// ============================================================================
// Prepared statements
// ============================================================================

/// Handle to a statement prepared on a specific connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Statement {
    id: u32,
    generation: u64,
}

impl Statement {
    /// Build a handle (used by backends)
    pub fn new(id: u32, generation: u64) -> Self {
        Self { id, generation }
    }

    /// Index in the owning connection's registry
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Generation of the connection that prepared this statement
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-connection table of prepared SQL texts, shared by backends
#[derive(Debug)]
pub struct StatementRegistry {
    generation: u64,
    sql: Vec<String>,
}

impl StatementRegistry {
    /// Empty registry for a connection of the given generation
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            sql: Vec::new(),
        }
    }

    /// Generation of the owning connection
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a statement and hand out its handle
    pub fn register(&mut self, sql: &str) -> Statement {
        let id = self.sql.len() as u32;
        self.sql.push(sql.to_string());
        Statement::new(id, self.generation)
    }

    /// SQL text behind a handle
    pub fn resolve(&self, stmt: &Statement) -> Result<&str> {
        if stmt.generation != self.generation {
            return Err(Error::StaleStatement {
                generation: stmt.generation,
                current: self.generation,
            });
        }
        self.sql
            .get(stmt.id as usize)
            .map(String::as_str)
            .ok_or(Error::UnknownStatement(stmt.id))
    }

    /// Number of registered statements
    pub fn len(&self) -> usize {
        self.sql.len()
    }

    /// Check if no statements are registered
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Forget all statements
    pub fn clear(&mut self) {
        self.sql.clear();
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A single database session
///
/// Connections are owned by exactly one worker thread at a time.
pub trait Connection: Send {
    /// Process-unique generation of this session
    fn generation(&self) -> u64;

    /// Cheap liveness probe
    fn ping(&mut self) -> Result<()>;

    /// Open a transaction
    fn begin(&mut self, opts: TxOptions) -> Result<()>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction
    fn rollback(&mut self) -> Result<()>;

    /// Prepare a statement on this session
    fn prepare(&mut self, sql: &str) -> Result<Statement>;

    /// Run a prepared statement that returns no rows; yields affected rows
    fn execute(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<u64>;

    /// Run a prepared statement that returns rows
    fn query(&mut self, stmt: &Statement, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Run ad-hoc SQL that returns no rows
    fn execute_sql(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Run ad-hoc SQL that returns rows
    fn query_sql(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Release every prepared statement held by this session
    fn close_statements(&mut self);
}

/// Factory for connections to one database
pub trait Connector: Send + Sync {
    /// Dialect spoken by connections from this connector
    fn dialect(&self) -> Dialect;

    /// Open a new session
    fn connect(&self) -> Result<Box<dyn Connection>>;
}
