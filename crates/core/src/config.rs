//! Workload configuration
//!
//! Loaded from a TOML file or built in code. Every field has a default, so a
//! file only needs to name what it changes. `validate` rejects combinations
//! the workload cannot run with; constructors call it before touching the
//! database.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tpcc_sql::IsolationLevel;
use tracing::debug;

/// Default transaction mix: new_order, payment, order_status, delivery, stock_level
pub const DEFAULT_WEIGHTS: [u32; 5] = [45, 43, 4, 4, 4];

// ============================================================================
// Enums
// ============================================================================

/// How warehouses are spread over table partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionType {
    /// `PARTITION BY HASH`
    #[default]
    Hash,
    /// `PARTITION BY RANGE` over contiguous warehouse blocks
    Range,
    /// `PARTITION BY LIST` with hash-like striping
    ListAsHash,
    /// `PARTITION BY LIST` with contiguous warehouse blocks
    ListAsRange,
}

impl FromStr for PartitionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "hash" => Ok(PartitionType::Hash),
            "2" | "range" => Ok(PartitionType::Range),
            "3" | "list_as_hash" | "list-as-hash" => Ok(PartitionType::ListAsHash),
            "4" | "list_as_range" | "list-as-range" => Ok(PartitionType::ListAsRange),
            other => Err(Error::InvalidConfig(format!(
                "unknown partition type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PartitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartitionType::Hash => "hash",
            PartitionType::Range => "range",
            PartitionType::ListAsHash => "list_as_hash",
            PartitionType::ListAsRange => "list_as_range",
        })
    }
}

/// Output format when generating files instead of loading a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// One CSV file per table per worker
    Csv,
}

// ============================================================================
// Config
// ============================================================================

/// Workload configuration
///
/// # Example
///
/// ```toml
/// db_name = "tpcc"
/// threads = 4
/// warehouses = 10
/// parts = 2
/// partition_type = "range"
/// weight = [45, 43, 4, 4, 4]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database name, used as the CSV file prefix
    pub db_name: String,
    /// Worker threads
    pub threads: usize,
    /// Table partitions; 0 or 1 disables partitioning
    pub parts: u32,
    /// Partitioning scheme
    pub partition_type: PartitionType,
    /// Warehouses (scale factor)
    pub warehouses: u32,
    /// Add foreign keys after creating tables
    pub use_fk: bool,
    /// Transaction isolation level
    pub isolation: IsolationLevel,
    /// Run the expensive consistency condition too
    pub check_all: bool,
    /// Skip consistency checks after loading
    pub no_check: bool,
    /// Transaction mix weights; empty means the default mix
    pub weight: Vec<u32>,
    /// Emulate keying and thinking times
    pub wait: bool,
    /// Latencies above this are clamped in histograms
    pub max_measure_latency_ms: u64,
    /// Generate files instead of loading a database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<OutputType>,
    /// Directory for generated files
    pub output_dir: PathBuf,
    /// Comma-separated tables to generate; empty means all
    pub specified_tables: String,
    /// Retries for a failed bulk insert
    pub prepare_retry_count: u32,
    /// Pause between bulk insert retries
    pub prepare_retry_interval_ms: u64,
    /// Seed for reproducible data and transaction inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_name: "tpcc".to_string(),
            threads: 1,
            parts: 1,
            partition_type: PartitionType::Hash,
            warehouses: 1,
            use_fk: false,
            isolation: IsolationLevel::Default,
            check_all: false,
            no_check: false,
            weight: DEFAULT_WEIGHTS.to_vec(),
            wait: false,
            max_measure_latency_ms: 16_000,
            output_type: None,
            output_dir: PathBuf::from("."),
            specified_tables: String::new(),
            prepare_retry_count: 0,
            prepare_retry_interval_ms: 5_000,
            seed: None,
        }
    }
}

impl Config {
    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(target: "tpcc::config", path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the workload cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be at least 1".into()));
        }
        if self.warehouses == 0 {
            return Err(Error::InvalidConfig(
                "warehouses must be at least 1".into(),
            ));
        }
        if self.parts == 0 {
            return Err(Error::InvalidConfig("parts must be at least 1".into()));
        }
        if self.parts > self.warehouses {
            return Err(Error::InvalidConfig(format!(
                "number warehouses {} must >= partition {}",
                self.warehouses, self.parts
            )));
        }
        self.weights()?;
        Ok(())
    }

    /// Effective transaction mix weights
    pub fn weights(&self) -> Result<[u32; 5]> {
        if self.weight.is_empty() {
            return Ok(DEFAULT_WEIGHTS);
        }
        let weights: [u32; 5] = self.weight.as_slice().try_into().map_err(|_| {
            Error::InvalidConfig(format!(
                "weight must have 5 entries, got {}",
                self.weight.len()
            ))
        })?;
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total != 100 {
            return Err(Error::InvalidConfig(format!(
                "the sum of weight should be 100: {:?}",
                weights
            )));
        }
        Ok(weights)
    }

    /// Histogram clamp
    pub fn max_measure_latency(&self) -> Duration {
        Duration::from_millis(self.max_measure_latency_ms)
    }

    /// Pause between bulk insert retries
    pub fn prepare_retry_interval(&self) -> Duration {
        Duration::from_millis(self.prepare_retry_interval_ms)
    }

    /// Whether tables get a partition clause
    pub fn partitioned(&self) -> bool {
        self.parts > 1
    }

    /// Default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# TPC-C workload configuration

# Database name, also the prefix of generated CSV files
db_name = "tpcc"

# Worker threads and scale factor
threads = 1
warehouses = 1

# Partitioning: parts <= 1 disables it
# partition_type: "hash", "range", "list_as_hash" or "list_as_range"
parts = 1
partition_type = "hash"

# Add foreign keys after creating tables
use_fk = false

# Isolation: "default", "read_committed", "repeatable_read", "serializable", ...
isolation = "default"

# Consistency checks
check_all = false
no_check = false

# Transaction mix: new_order, payment, order_status, delivery, stock_level
weight = [45, 43, 4, 4, 4]

# Emulate keying and thinking times
wait = false

# Latencies above this are clamped in histograms
max_measure_latency_ms = 16000

# Generate CSV files instead of loading a database
# output_type = "csv"
output_dir = "."
# Comma-separated subset of tables to generate (empty = all)
specified_tables = ""

# Bulk insert retries
prepare_retry_count = 0
prepare_retry_interval_ms = 5000

# Seed for reproducible runs
# seed = 42
"#
    }
}
