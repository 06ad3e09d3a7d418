//! Error types for the benchmark driver
//!
//! Every fallible operation in loading, running and checking returns
//! `Result<T>`. SQL failures carry the statement text so a failing
//! transaction can be traced back to the query that broke.

use std::io;
use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the benchmark driver
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected at construction time
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A specific statement failed
    #[error("exec {query} failed: {source}")]
    Sql {
        /// Statement text (or its leading part for bulk inserts)
        query: String,
        /// Driver error
        #[source]
        source: tpcc_sql::Error,
    },

    /// Connection-level or row-access failure not tied to one statement
    #[error("driver error: {0}")]
    Driver(#[from] tpcc_sql::Error),

    /// I/O error (CSV output, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(String),

    /// Config file could not be parsed or rendered
    #[error("config file error: {0}")]
    Toml(String),

    /// A row the workload depends on is missing
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing row
        what: String,
    },

    /// A consistency condition does not hold
    #[error("check warehouse {warehouse} at condition {condition} failed: {detail}")]
    CheckFailed {
        /// Warehouse being checked
        warehouse: u32,
        /// Condition identifier ("3.3.2.1" ...)
        condition: &'static str,
        /// What was expected and what was found
        detail: String,
    },

    /// Reconnecting after a failed ping did not succeed
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The phase was cancelled before the operation finished
    #[error("operation cancelled")]
    Cancelled,

    /// A worker thread panicked
    #[error("worker thread {thread_id} panicked")]
    WorkerPanicked {
        /// Worker index
        thread_id: usize,
    },

    /// Transactions failed while errors were being ignored
    #[error("{count} transactions failed")]
    IgnoredFailures {
        /// Failed transactions over all workers
        count: u64,
    },
}

impl Error {
    /// Build a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Check if the error came from cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Toml(e.to_string())
    }
}

/// Attach statement text to driver errors
pub trait SqlResultExt<T> {
    /// Map a driver error to `Error::Sql` with the given statement text
    fn with_query(self, query: &str) -> Result<T>;
}

impl<T> SqlResultExt<T> for std::result::Result<T, tpcc_sql::Error> {
    fn with_query(self, query: &str) -> Result<T> {
        self.map_err(|source| Error::Sql {
            query: query.to_string(),
            source,
        })
    }
}
