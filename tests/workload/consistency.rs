//! Consistency conditions after a mixed run, detection of broken invariants,
//! reporting and schema removal

use crate::common::*;
use std::sync::Arc;
use std::time::Duration;
use tpcc_bench::check::{check_condition, conditions};
use tpcc_bench::{Dialect, ReportRecord};

#[test]
fn mixed_run_keeps_database_consistent() {
    let db = TestDb::loaded();
    let reporter = Arc::new(RecordingReporter::new());
    let workloader = db
        .workloader_with(Config {
            threads: 2,
            ..test_config()
        })
        .with_reporter(reporter.clone());

    let runner = Runner::new(RunnerConfig {
        threads: 2,
        total_count: 400,
        output_interval: Duration::from_millis(50),
        ..RunnerConfig::default()
    });
    let report = runner.execute(&workloader, Action::Run);
    assert!(report.is_success(), "{:?}", report.errors);

    let executed: u64 = ["new_order", "payment", "order_status", "delivery", "stock_level"]
        .iter()
        .filter_map(|op| workloader.rt_measurement().summary_info(op))
        .map(|info| info.count)
        .sum();
    assert_eq!(executed, 400);

    // Final report carries throughput
    let (tpmc, efficiency) = reporter.tpmc().expect("tpmC reported");
    assert!(tpmc > 0.0);
    assert!(efficiency > 0.0);
    assert!(reporter.records().iter().any(|r| matches!(
        r,
        ReportRecord::Latency { op, .. } if op == "NEW_ORDER"
    )));

    let report = runner.execute(&workloader, Action::Check);
    assert!(report.is_success(), "{:?}", report.errors);
}

#[test]
fn broken_warehouse_ytd_is_detected() {
    let db = TestDb::loaded();
    db.exec("UPDATE district SET d_ytd = d_ytd + 1 WHERE d_w_id = 1 AND d_id = 1");
    let workloader = db.workloader();

    let report = runner(1).execute(&workloader, Action::Check);
    assert_eq!(report.errors.len(), 1);
    match &report.errors[0].1 {
        Error::CheckFailed {
            warehouse,
            condition,
            ..
        } => {
            assert_eq!(*warehouse, 1);
            assert_eq!(*condition, "3.3.2.1");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn no_check_skips_checks_after_load() {
    let db = TestDb::loaded();
    db.exec("UPDATE district SET d_ytd = d_ytd + 1 WHERE d_w_id = 1 AND d_id = 1");
    let workloader = db.workloader_with(Config {
        no_check: true,
        ..test_config()
    });

    let report = runner(1).execute(&workloader, Action::CheckPrepare);
    assert!(report.is_success(), "{:?}", report.errors);
    // The post-run check still runs
    let report = runner(1).execute(&workloader, Action::Check);
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn each_condition_detects_its_own_breakage() {
    let db = TestDb::loaded();
    let mut conn = db.conn();
    let all = conditions(Dialect::Sqlite, true);
    for condition in &all {
        check_condition(conn.as_mut(), condition, 1).unwrap();
    }

    // Orphan new_order row breaks the order-id bookkeeping of district 2
    db.exec("DELETE FROM new_order WHERE no_w_id = 1 AND no_d_id = 2 AND no_o_id = 2500");
    let failed: Vec<_> = all
        .iter()
        .filter(|c| check_condition(conn.as_mut(), c, 1).is_err())
        .map(|c| c.id)
        .collect();
    assert!(failed.contains(&"3.3.2.3"), "failed: {:?}", failed);
    assert!(!failed.contains(&"3.3.2.1"));
}

#[test]
fn balance_of_customer_without_delivered_orders_is_checked() {
    let db = TestDb::loaded();
    let mut conn = db.conn();
    // Order 3000 is still pending, so its customer has nothing delivered
    db.exec(
        "UPDATE customer SET c_balance = c_balance + 5 \
         WHERE c_w_id = 1 AND c_d_id = 1 AND c_id = \
         (SELECT o_c_id FROM orders WHERE o_w_id = 1 AND o_d_id = 1 AND o_id = 3000)",
    );
    let failed: Vec<_> = conditions(Dialect::Sqlite, false)
        .iter()
        .filter(|c| check_condition(conn.as_mut(), c, 1).is_err())
        .map(|c| c.id)
        .collect();
    assert_eq!(failed, vec!["3.3.2.10", "3.3.2.12"]);
}

#[test]
fn cleanup_drops_every_table() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let report = runner(1).execute(&workloader, Action::Cleanup);
    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(
        db.scalar_i64("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'"),
        0
    );
}

#[test]
fn wait_times_are_measured_when_enabled() {
    let db = TestDb::loaded();
    let workloader = db.workloader_with(Config {
        wait: true,
        ..test_config()
    });
    let mut state = workloader.init_thread(0).unwrap();

    // Keying time is at least two seconds, so cancellation cuts it short
    let cancel = CancelToken::with_timeout(Duration::from_millis(20));
    workloader.run(&mut state, &cancel).unwrap();

    let keyed = workloader
        .wait_measurement()
        .summary()
        .keys()
        .any(|op| op.starts_with("keyingTime-"));
    assert!(keyed);
    // Cancelled during keying: nothing was executed
    assert!(workloader.rt_measurement().summary().is_empty());
}
