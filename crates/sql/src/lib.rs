//! SQL executor abstraction for the benchmark engine
//!
//! The engine never talks to a concrete database driver. It goes through:
//! - `Connector`: opens connections and reports the SQL dialect
//! - `Connection`: begin/commit/rollback, prepared and ad-hoc statements, ping
//! - `Transaction`: RAII guard that rolls back unless committed
//! - `SqlValue` / `Row`: driver-neutral parameters and result rows
//! - `Dialect`: the handful of syntax differences the workload depends on
//!
//! A SQLite backend is provided behind the `sqlite` feature (on by default).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod dialect;
pub mod error;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod transaction;
pub mod value;

pub use connection::{
    next_generation, Connection, Connector, IsolationLevel, Statement, StatementRegistry,
    TxOptions,
};
pub use dialect::Dialect;
pub use error::{Error, Result};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteConnector};
pub use transaction::Transaction;
pub use value::{Row, SqlValue};
