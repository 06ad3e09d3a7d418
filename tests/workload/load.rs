//! Initial population: cardinalities and generated values of a loaded warehouse

use crate::common::*;
use tpcc_bench::schema::{
    CUSTOMERS_PER_DISTRICT, DISTRICTS_PER_WAREHOUSE, MAX_ITEMS, NEW_ORDERS_PER_DISTRICT,
    ORDERS_PER_DISTRICT, STOCK_PER_WAREHOUSE,
};

#[test]
fn loaded_table_cardinalities() {
    let db = TestDb::loaded();
    let districts = DISTRICTS_PER_WAREHOUSE;

    assert_eq!(db.count("item"), MAX_ITEMS);
    assert_eq!(db.count("warehouse"), 1);
    assert_eq!(db.count("stock"), STOCK_PER_WAREHOUSE);
    assert_eq!(db.count("district"), districts);
    assert_eq!(db.count("customer"), districts * CUSTOMERS_PER_DISTRICT);
    assert_eq!(db.count("history"), districts * CUSTOMERS_PER_DISTRICT);
    assert_eq!(db.count("orders"), districts * ORDERS_PER_DISTRICT);
    assert_eq!(db.count("new_order"), districts * NEW_ORDERS_PER_DISTRICT);
    assert_eq!(
        db.count("order_line"),
        db.scalar_i64("SELECT SUM(o_ol_cnt) FROM orders")
    );
}

#[test]
fn loaded_values_follow_population_rules() {
    let db = TestDb::loaded();

    assert_eq!(
        db.scalar_str("SELECT c_last FROM customer WHERE c_w_id = 1 AND c_d_id = 1 AND c_id = 1"),
        "BARBARBAR"
    );
    assert_eq!(
        db.scalar_str("SELECT c_last FROM customer WHERE c_w_id = 1 AND c_d_id = 3 AND c_id = 1000"),
        "EINGEINGEING"
    );
    assert_eq!(db.scalar_i64("SELECT MIN(d_next_o_id) FROM district"), 3001);
    assert_eq!(db.scalar_i64("SELECT MAX(d_next_o_id) FROM district"), 3001);

    // Orders up to 2100 are delivered, the rest are not
    assert_eq!(
        db.scalar_i64("SELECT COUNT(*) FROM orders WHERE o_id < 2101 AND o_carrier_id IS NULL"),
        0
    );
    assert_eq!(
        db.scalar_i64("SELECT COUNT(*) FROM orders WHERE o_id >= 2101 AND o_carrier_id IS NOT NULL"),
        0
    );
    assert_eq!(db.scalar_i64("SELECT MIN(no_o_id) FROM new_order"), 2101);

    // Every customer places exactly one order per district
    assert_eq!(
        db.scalar_i64("SELECT COUNT(DISTINCT o_c_id) FROM orders WHERE o_w_id = 1 AND o_d_id = 5"),
        CUSTOMERS_PER_DISTRICT
    );

    let min_ol = db.scalar_i64("SELECT MIN(o_ol_cnt) FROM orders");
    let max_ol = db.scalar_i64("SELECT MAX(o_ol_cnt) FROM orders");
    assert!(min_ol >= 5 && max_ol <= 15);

    // Roughly 10% of customers have bad credit
    let bad = db.scalar_i64("SELECT COUNT(*) FROM customer WHERE c_credit = 'BC'");
    assert!((2_400..3_600).contains(&bad), "bad credit customers: {}", bad);

    // Roughly 10% of items are marked ORIGINAL
    let original = db.scalar_i64("SELECT COUNT(*) FROM item WHERE i_data LIKE '%ORIGINAL%'");
    assert!((8_000..12_000).contains(&original), "original items: {}", original);
}

#[test]
fn check_prepare_passes_after_load() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let report = runner(1).execute(&workloader, Action::CheckPrepare);
    assert!(report.is_success(), "{:?}", report.errors);
}

#[test]
fn check_prepare_sharded_over_threads() {
    let db = TestDb::loaded();
    let workloader = db.workloader_with(Config {
        threads: 3,
        ..test_config()
    });
    let report = runner(3).execute(&workloader, Action::CheckPrepare);
    assert!(report.is_success(), "{:?}", report.errors);
}

#[test]
fn prepare_without_drop_fails_on_existing_tables() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let report = runner(1).execute(&workloader, Action::Prepare);
    assert!(!report.is_success());
    assert!(matches!(report.errors[0].1, Error::Sql { .. }));
}
