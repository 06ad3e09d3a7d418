//! Errors raised by the SQL executor layer

use thiserror::Error;

/// Result type alias for SQL executor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by connections, statements and row accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Error reported by the underlying database driver
    #[error("driver error: {reason}")]
    Driver {
        /// Driver-provided message
        reason: String,
    },

    /// A prepared statement was used on a different connection than the one
    /// that prepared it (typically after a reconnect)
    #[error("stale statement: prepared on connection generation {generation}, current is {current}")]
    StaleStatement {
        /// Generation the statement was prepared on
        generation: u64,
        /// Generation of the connection it was used on
        current: u64,
    },

    /// Statement handle does not belong to this connection's registry
    #[error("unknown statement id {0}")]
    UnknownStatement(u32),

    /// Column value could not be converted to the requested type
    #[error("column {column}: expected {expected}, got {actual}")]
    Conversion {
        /// Zero-based column index
        column: usize,
        /// Requested type
        expected: &'static str,
        /// Stored value's type
        actual: &'static str,
    },

    /// `begin` called while a transaction is already open
    #[error("transaction already active")]
    TransactionActive,

    /// `commit`/`rollback` called with no open transaction
    #[error("no active transaction")]
    NoTransaction,
}

impl Error {
    /// Build a driver error from any displayable source
    pub fn driver(reason: impl std::fmt::Display) -> Self {
        Error::Driver {
            reason: reason.to_string(),
        }
    }
}
