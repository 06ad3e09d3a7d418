//! CSV generation

use crate::common::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tpcc_bench::{CsvWorkloader, OutputType};

fn csv_config(dir: &Path, tables: &str, warehouses: u32, threads: usize) -> Config {
    Config {
        warehouses,
        threads,
        output_type: Some(OutputType::Csv),
        output_dir: dir.to_path_buf(),
        specified_tables: tables.into(),
        ..test_config()
    }
}

fn records(path: &Path) -> Vec<csv::StringRecord> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .map(|r| r.unwrap())
        .collect()
}

#[test]
fn csv_files_split_per_thread() {
    let dir = TempDir::new().unwrap();
    let cfg = csv_config(dir.path(), "warehouse,district,new_order", 3, 2);
    let workloader = CsvWorkloader::new(None, cfg).unwrap();

    let report = runner(2).execute(&workloader, Action::Prepare);
    assert!(report.is_success(), "{:?}", report.errors);

    // Warehouses 1 and 3 go to thread 0, warehouse 2 to thread 1
    let first = records(&dir.path().join("tpcc.warehouse.0.csv"));
    let second = records(&dir.path().join("tpcc.warehouse.1.csv"));
    let ids: Vec<_> = first.iter().map(|r| r[0].to_string()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(second.len(), 1);
    assert_eq!(&second[0][0], "2");
    assert_eq!(first[0].len(), 9);

    let districts = records(&dir.path().join("tpcc.district.0.csv")).len()
        + records(&dir.path().join("tpcc.district.1.csv")).len();
    assert_eq!(districts, 30);

    // District-scoped tables are striped over all 30 districts
    let pending_0 = records(&dir.path().join("tpcc.new_order.0.csv")).len();
    let pending_1 = records(&dir.path().join("tpcc.new_order.1.csv")).len();
    assert_eq!(pending_0, 15 * 900);
    assert_eq!(pending_1, 15 * 900);

    assert!(!dir.path().join("tpcc.item.0.csv").exists());
    assert!(!dir.path().join("tpcc.customer.0.csv").exists());
}

#[test]
fn csv_orders_and_lines_agree() {
    let dir = TempDir::new().unwrap();
    let cfg = csv_config(dir.path(), "orders,order_line", 1, 1);
    let workloader = CsvWorkloader::new(None, cfg).unwrap();
    let report = runner(1).execute(&workloader, Action::Prepare);
    assert!(report.is_success(), "{:?}", report.errors);

    let orders = records(&dir.path().join("tpcc.orders.0.csv"));
    let lines = records(&dir.path().join("tpcc.order_line.0.csv"));
    assert_eq!(orders.len(), 30_000);
    let expected_lines: usize = orders.iter().map(|r| r[6].parse::<usize>().unwrap()).sum();
    assert_eq!(lines.len(), expected_lines);

    // Undelivered orders spell their carrier as NULL
    let undelivered = orders.iter().filter(|r| &r[5] == "NULL").count();
    assert_eq!(undelivered, 9_000);
}

#[test]
fn csv_rejects_order_line_without_orders() {
    let dir = TempDir::new().unwrap();
    let cfg = csv_config(dir.path(), "order_line", 1, 1);
    assert!(matches!(
        CsvWorkloader::new(None, cfg),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn csv_with_connector_creates_schema() {
    let out = TempDir::new().unwrap();
    let db = TestDb::empty();
    let cfg = csv_config(out.path(), "warehouse", 2, 2);
    let connector: Arc<dyn Connector> = db.connector.clone();
    let workloader = CsvWorkloader::new(Some(connector), cfg).unwrap();

    let report = runner(2).execute(&workloader, Action::Prepare);
    assert!(report.is_success(), "{:?}", report.errors);

    assert_eq!(
        db.scalar_i64("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'"),
        9
    );
    // Rows go to files, not to the database
    assert_eq!(db.count("warehouse"), 0);
    assert!(out.path().join("tpcc.warehouse.1.csv").exists());
}

#[test]
fn csv_other_phases_do_nothing() {
    let dir = TempDir::new().unwrap();
    let cfg = csv_config(dir.path(), "warehouse", 1, 1);
    let workloader = CsvWorkloader::new(None, cfg).unwrap();
    for action in [Action::CheckPrepare, Action::Run, Action::Check, Action::Cleanup] {
        let runner = Runner::new(RunnerConfig {
            total_count: 10,
            ..RunnerConfig::default()
        });
        assert!(runner.execute(&workloader, action).is_success());
    }
}
