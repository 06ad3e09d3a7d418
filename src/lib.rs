//! tpcc-bench - TPC-C OLTP benchmark driver
//!
//! Creates the nine-table TPC-C schema, loads the initial population,
//! drives the weighted five-transaction mix from a pool of worker threads,
//! reports latency and tpmC, and verifies the consistency conditions.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tpcc_bench::{Action, Config, Runner, RunnerConfig, SqliteConnector, Workloader};
//!
//! let connector = Arc::new(SqliteConnector::open("tpcc.db"));
//! let workloader = Workloader::new(connector, Config::default())?;
//!
//! let runner = Runner::new(RunnerConfig {
//!     total_count: 10_000,
//!     ..RunnerConfig::default()
//! });
//! runner.execute(&workloader, Action::Prepare).into_result()?;
//! runner.execute(&workloader, Action::Run).into_result()?;
//! runner.execute(&workloader, Action::Check).into_result()?;
//! ```
//!
//! # Architecture
//!
//! Layering, bottom-up: `tpcc-sql` (driver abstraction), `tpcc-core`
//! (errors, config, random data), `tpcc-load` (bulk row sinks),
//! `tpcc-measurement` (histograms and reports) and `tpcc-engine` (schema,
//! loader, transactions, checks and the runner). This crate re-exports the
//! public API of all of them.

pub use tpcc_core::{
    schema, CancelToken, Config, Error, NuRandConstants, OutputType, PartitionType,
    RandomGenerator, Result, Table, DEFAULT_WEIGHTS,
};
pub use tpcc_engine::{
    Action, CsvThreadState, CsvWorkloader, DdlManager, Deck, ExecutionReport, Runner, RunnerConfig,
    ThreadState, TpccLoader, TxnKind, TxnOutcome, Workload, Workloader, MAX_TPMC_PER_WAREHOUSE,
};
pub use tpcc_load::{BatchLoader, CsvBatchLoader, SqlBatchLoader};
pub use tpcc_measurement::{
    Histogram, LatencySummary, Measurement, RecordingReporter, ReportRecord, Reporter,
    StdoutReporter,
};
pub use tpcc_sql::{Connection, Connector, Dialect, IsolationLevel, Row, SqlValue, TxOptions};
#[cfg(feature = "sqlite")]
pub use tpcc_sql::{SqliteConnection, SqliteConnector};

/// The five transactions and their inputs
pub mod txn {
    pub use tpcc_engine::txn::*;
}

/// Consistency conditions
pub mod check {
    pub use tpcc_engine::check::*;
}
