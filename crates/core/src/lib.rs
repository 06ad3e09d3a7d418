//! Core types for the TPC-C benchmark driver
//!
//! This crate defines the pieces shared by loading, measurement and the
//! transaction engine:
//! - Error: error type hierarchy
//! - Config: workload configuration (TOML-loadable)
//! - RandomGenerator / NuRandConstants: TPC-C random data generation
//! - CancelToken: cooperative cancellation with optional deadline
//! - schema: table names and cardinalities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod random;
pub mod schema;

pub use cancel::CancelToken;
pub use config::{Config, OutputType, PartitionType, DEFAULT_WEIGHTS};
pub use error::{Error, Result, SqlResultExt};
pub use random::{nurand, rand_c_last_syllables, NuRandConstants, RandomGenerator};
pub use schema::Table;
