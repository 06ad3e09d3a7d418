//! TPC-C workload engine
//!
//! This crate puts the lower layers together:
//! - ddl: schema creation and removal per dialect
//! - load: initial population, shared by the SQL and CSV targets
//! - txn: the five transactions
//! - deck: weighted transaction scheduling
//! - check: consistency conditions
//! - Workloader / CsvWorkloader: the two workloads
//! - Runner: multi-threaded phase driver
//!
//! The engine is the only component that knows about:
//! - Worker state and reconnection
//! - Measurement naming and reporting
//! - How work is split between threads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod csv;
pub mod ddl;
pub mod deck;
pub mod load;
pub mod runner;
pub mod state;
pub mod tpcc;
pub mod txn;
pub mod workload;

pub use check::{conditions, Condition};
pub use csv::{CsvThreadState, CsvWorkloader};
pub use ddl::DdlManager;
pub use deck::Deck;
pub use load::{prepare_workload, TpccLoader};
pub use runner::{Action, ExecutionReport, Runner, RunnerConfig};
pub use state::ThreadState;
pub use tpcc::{Workloader, MAX_TPMC_PER_WAREHOUSE};
pub use txn::{
    CustomerSelector, DeliveryInput, NewOrderInput, NewOrderItem, OrderStatusInput, PaymentInput,
    Statements, StockLevelInput, TxnKind, TxnOutcome,
};
pub use workload::Workload;
