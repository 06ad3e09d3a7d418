//! Shared fixtures for the workload integration suite.
//!
//! Loading one warehouse takes a while, so the suite loads it once into a
//! template database and every test works on its own copy.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
pub use tpcc_bench::{
    Action, CancelToken, Config, Connection, Connector, Error, RecordingReporter, Runner,
    RunnerConfig, SqliteConnector, TxnOutcome, Workload, Workloader,
};

pub const DB_FILE: &str = "tpcc.db";
pub const SEED: u64 = 42;

// ============================================================================
// Configuration
// ============================================================================

/// One warehouse, reproducible randomness
pub fn test_config() -> Config {
    Config {
        warehouses: 1,
        threads: 1,
        seed: Some(SEED),
        ..Config::default()
    }
}

pub fn runner(threads: usize) -> Runner {
    Runner::new(RunnerConfig {
        threads,
        ..RunnerConfig::default()
    })
}

// ============================================================================
// Template database
// ============================================================================

static TEMPLATE: OnceLock<TempDir> = OnceLock::new();

/// Route engine logs through the test harness capture
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn template_dir() -> &'static Path {
    TEMPLATE
        .get_or_init(|| {
            init_logging();
            let dir = TempDir::new().expect("template dir");
            let connector = Arc::new(SqliteConnector::open(dir.path().join(DB_FILE)));
            let cfg = Config {
                threads: 2,
                ..test_config()
            };
            let workloader = Workloader::new(connector.clone(), cfg).expect("workloader");
            let report = runner(2).execute(&workloader, Action::Prepare);
            assert!(report.is_success(), "template load failed: {:?}", report.errors);

            let mut conn = connector.connect().expect("connect");
            conn.query_sql("PRAGMA wal_checkpoint(TRUNCATE)", &[])
                .expect("checkpoint");
            dir
        })
        .path()
}

// ============================================================================
// TestDb
// ============================================================================

/// Private copy of the loaded one-warehouse database
pub struct TestDb {
    pub dir: TempDir,
    pub connector: Arc<SqliteConnector>,
}

impl TestDb {
    /// Copy of the template
    pub fn loaded() -> Self {
        let template = template_dir();
        let dir = TempDir::new().unwrap();
        for suffix in ["", "-wal", "-shm"] {
            let name = format!("{}{}", DB_FILE, suffix);
            let src = template.join(&name);
            if src.exists() {
                fs::copy(&src, dir.path().join(&name)).unwrap();
            }
        }
        Self::at(dir)
    }

    /// Empty database
    pub fn empty() -> Self {
        Self::at(TempDir::new().unwrap())
    }

    fn at(dir: TempDir) -> Self {
        let connector = Arc::new(SqliteConnector::open(dir.path().join(DB_FILE)));
        Self { dir, connector }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join(DB_FILE)
    }

    pub fn workloader(&self) -> Workloader {
        self.workloader_with(test_config())
    }

    pub fn workloader_with(&self, cfg: Config) -> Workloader {
        Workloader::new(self.connector.clone(), cfg).unwrap()
    }

    pub fn conn(&self) -> Box<dyn Connection> {
        self.connector.connect().unwrap()
    }

    /// First column of the first row as an integer
    pub fn scalar_i64(&self, sql: &str) -> i64 {
        self.conn().query_sql(sql, &[]).unwrap()[0].get_i64(0).unwrap()
    }

    /// First column of the first row as a float
    pub fn scalar_f64(&self, sql: &str) -> f64 {
        self.conn().query_sql(sql, &[]).unwrap()[0].get_f64(0).unwrap()
    }

    pub fn scalar_str(&self, sql: &str) -> String {
        self.conn().query_sql(sql, &[]).unwrap()[0]
            .get_str(0)
            .unwrap()
            .to_string()
    }

    pub fn count(&self, table: &str) -> i64 {
        self.scalar_i64(&format!("SELECT COUNT(*) FROM {}", table))
    }

    pub fn exec(&self, sql: &str) {
        self.conn().execute_sql(sql, &[]).unwrap();
    }
}

/// Money comparison at cent precision
pub fn assert_cents(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.006,
        "expected {:.2}, got {:.2}",
        expected,
        actual
    );
}
