//! Workload integration tests on SQLite
//!
//! Full one-warehouse load, the five transactions driven with hand-built
//! inputs, consistency checks after loading and after a mixed run, and CSV
//! generation.

mod common;

mod consistency;
mod csv_output;
mod load;
mod transactions;
