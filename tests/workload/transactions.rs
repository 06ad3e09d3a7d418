//! The five transactions driven with hand-built inputs

use crate::common::*;
use tpcc_bench::txn::{
    CustomerSelector, DeliveryInput, NewOrderInput, NewOrderItem, OrderStatusInput, PaymentInput,
    StockLevelInput, UNUSED_ITEM_ID,
};
use tpcc_bench::ThreadState;

fn worker(workloader: &Workloader) -> ThreadState {
    workloader.init_thread(0).unwrap()
}

fn order_input(item_ids: &[i64]) -> NewOrderInput {
    NewOrderInput {
        w_id: 1,
        d_id: 1,
        c_id: 1,
        items: item_ids
            .iter()
            .map(|&ol_i_id| NewOrderItem {
                ol_i_id,
                ol_supply_w_id: 1,
                ol_quantity: 3,
            })
            .collect(),
    }
}

// ============================================================================
// NewOrder
// ============================================================================

#[test]
fn new_order_commits_order_and_lines() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    let quantity_before =
        db.scalar_i64("SELECT s_quantity FROM stock WHERE s_w_id = 1 AND s_i_id = 4");

    // Out of order on purpose: lines are sorted before stock is touched
    let outcome = workloader
        .execute_new_order(&mut state, &order_input(&[9, 4, 7, 1, 2]))
        .unwrap();
    assert_eq!(outcome, TxnOutcome::Committed);

    assert_eq!(
        db.scalar_i64("SELECT d_next_o_id FROM district WHERE d_w_id = 1 AND d_id = 1"),
        3002
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT o_ol_cnt FROM orders WHERE o_w_id = 1 AND o_d_id = 1 AND o_id = 3001"
        ),
        5
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT o_all_local FROM orders WHERE o_w_id = 1 AND o_d_id = 1 AND o_id = 3001"
        ),
        1
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT COUNT(*) FROM new_order WHERE no_w_id = 1 AND no_d_id = 1 AND no_o_id = 3001"
        ),
        1
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT COUNT(*) FROM order_line WHERE ol_w_id = 1 AND ol_d_id = 1 AND ol_o_id = 3001"
        ),
        5
    );

    let mut expected = quantity_before - 3;
    if expected < 10 {
        expected += 91;
    }
    assert_eq!(
        db.scalar_i64("SELECT s_quantity FROM stock WHERE s_w_id = 1 AND s_i_id = 4"),
        expected
    );
    assert_eq!(
        db.scalar_i64("SELECT s_ytd FROM stock WHERE s_w_id = 1 AND s_i_id = 4"),
        3
    );
    assert_eq!(
        db.scalar_i64("SELECT s_order_cnt FROM stock WHERE s_w_id = 1 AND s_i_id = 4"),
        1
    );
}

#[test]
fn new_order_line_amounts_use_item_price() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    workloader
        .execute_new_order(&mut state, &order_input(&[11, 12, 13, 14, 15]))
        .unwrap();

    let price = db.scalar_f64("SELECT i_price FROM item WHERE i_id = 13");
    let w_tax = db.scalar_f64("SELECT w_tax FROM warehouse WHERE w_id = 1");
    let d_tax = db.scalar_f64("SELECT d_tax FROM district WHERE d_w_id = 1 AND d_id = 1");
    let discount =
        db.scalar_f64("SELECT c_discount FROM customer WHERE c_w_id = 1 AND c_d_id = 1 AND c_id = 1");
    let amount = db.scalar_f64(
        "SELECT ol_amount FROM order_line \
         WHERE ol_w_id = 1 AND ol_d_id = 1 AND ol_o_id = 3001 AND ol_i_id = 13",
    );
    assert_cents(amount, 3.0 * price * (1.0 + w_tax + d_tax) * (1.0 - discount));
}

#[test]
fn new_order_with_unused_item_rolls_back() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    let orders_before = db.count("orders");
    let lines_before = db.count("order_line");

    let outcome = workloader
        .execute_new_order(&mut state, &order_input(&[1, 2, 3, 4, UNUSED_ITEM_ID]))
        .unwrap();
    assert_eq!(outcome, TxnOutcome::RolledBack);

    assert_eq!(
        db.scalar_i64("SELECT d_next_o_id FROM district WHERE d_w_id = 1 AND d_id = 1"),
        3001
    );
    assert_eq!(db.count("orders"), orders_before);
    assert_eq!(db.count("order_line"), lines_before);
    assert_eq!(db.scalar_i64("SELECT SUM(s_ytd) FROM stock"), 0);

    // The connection is still usable afterwards
    let outcome = workloader
        .execute_new_order(&mut state, &order_input(&[1, 2, 3, 4, 5]))
        .unwrap();
    assert_eq!(outcome, TxnOutcome::Committed);
}

// ============================================================================
// Payment
// ============================================================================

#[test]
fn payment_by_id_moves_money() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    let history_before = db.count("history");

    let input = PaymentInput {
        w_id: 1,
        d_id: 2,
        c_w_id: 1,
        c_d_id: 3,
        customer: CustomerSelector::ById(1500),
        amount: 123.45,
    };
    assert_eq!(
        workloader.execute_payment(&mut state, &input).unwrap(),
        TxnOutcome::Committed
    );

    assert_cents(db.scalar_f64("SELECT w_ytd FROM warehouse WHERE w_id = 1"), 300_123.45);
    assert_cents(
        db.scalar_f64("SELECT d_ytd FROM district WHERE d_w_id = 1 AND d_id = 2"),
        30_123.45,
    );
    assert_cents(
        db.scalar_f64(
            "SELECT c_balance FROM customer WHERE c_w_id = 1 AND c_d_id = 3 AND c_id = 1500",
        ),
        -133.45,
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT c_payment_cnt FROM customer WHERE c_w_id = 1 AND c_d_id = 3 AND c_id = 1500"
        ),
        2
    );
    assert_eq!(db.count("history"), history_before + 1);

    let w_name = db.scalar_str("SELECT w_name FROM warehouse WHERE w_id = 1");
    let d_name = db.scalar_str("SELECT d_name FROM district WHERE d_w_id = 1 AND d_id = 2");
    assert_eq!(
        db.scalar_str("SELECT h_data FROM history WHERE h_amount > 100"),
        format!("{}    {}", w_name, d_name)
    );
}

#[test]
fn payment_on_bad_credit_prepends_audit_entry() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    let c_id = db.scalar_i64(
        "SELECT MIN(c_id) FROM customer WHERE c_w_id = 1 AND c_d_id = 4 AND c_credit = 'BC'",
    );
    let input = PaymentInput {
        w_id: 1,
        d_id: 4,
        c_w_id: 1,
        c_d_id: 4,
        customer: CustomerSelector::ById(c_id),
        amount: 12.5,
    };
    workloader.execute_payment(&mut state, &input).unwrap();

    let c_data = db.scalar_str(&format!(
        "SELECT c_data FROM customer WHERE c_w_id = 1 AND c_d_id = 4 AND c_id = {}",
        c_id
    ));
    assert!(
        c_data.starts_with(&format!("| {:4}  4    1  4    1 $  12.50", c_id)),
        "c_data: {}",
        c_data
    );
    assert!(c_data.len() <= 500);
}

#[test]
fn payment_by_last_name_picks_middle_customer() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    let mut ids: Vec<i64> = db
        .conn()
        .query_sql(
            "SELECT c_id FROM customer WHERE c_w_id = 1 AND c_d_id = 1 AND c_last = 'BARBARBAR' \
             ORDER BY c_first",
            &[],
        )
        .unwrap()
        .iter()
        .map(|row| row.get_i64(0).unwrap())
        .collect();
    assert!(!ids.is_empty());
    let expected = ids.remove((ids.len() + 1) / 2 - 1);

    let input = PaymentInput {
        w_id: 1,
        d_id: 1,
        c_w_id: 1,
        c_d_id: 1,
        customer: CustomerSelector::ByLastName("BARBARBAR".into()),
        amount: 50.0,
    };
    workloader.execute_payment(&mut state, &input).unwrap();

    assert_cents(
        db.scalar_f64(&format!(
            "SELECT c_balance FROM customer WHERE c_w_id = 1 AND c_d_id = 1 AND c_id = {}",
            expected
        )),
        -60.0,
    );
}

#[test]
fn payment_for_unknown_last_name_changes_nothing() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    let input = PaymentInput {
        w_id: 1,
        d_id: 1,
        c_w_id: 1,
        c_d_id: 1,
        customer: CustomerSelector::ByLastName("NOBODY".into()),
        amount: 10.0,
    };
    let err = workloader.execute_payment(&mut state, &input).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{}", err);

    // The district and warehouse updates were rolled back
    assert_cents(db.scalar_f64("SELECT w_ytd FROM warehouse WHERE w_id = 1"), 300_000.0);
    assert_cents(
        db.scalar_f64("SELECT d_ytd FROM district WHERE d_w_id = 1 AND d_id = 1"),
        30_000.0,
    );
}

// ============================================================================
// OrderStatus, StockLevel
// ============================================================================

#[test]
fn read_only_transactions_commit() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    for customer in [
        CustomerSelector::ById(42),
        CustomerSelector::ByLastName("OUGHTOUGHTOUGHT".into()),
    ] {
        let input = OrderStatusInput {
            w_id: 1,
            d_id: 7,
            customer,
        };
        assert_eq!(
            workloader.execute_order_status(&mut state, &input).unwrap(),
            TxnOutcome::Committed
        );
    }

    for threshold in [10, 20] {
        let input = StockLevelInput {
            w_id: 1,
            d_id: 7,
            threshold,
        };
        assert_eq!(
            workloader.execute_stock_level(&mut state, &input).unwrap(),
            TxnOutcome::Committed
        );
    }
}

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn delivery_delivers_oldest_order_of_each_district() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);

    let c_id = db.scalar_i64("SELECT o_c_id FROM orders WHERE o_w_id = 1 AND o_d_id = 6 AND o_id = 2101");
    let amount = db.scalar_f64(
        "SELECT SUM(ol_amount) FROM order_line WHERE ol_w_id = 1 AND ol_d_id = 6 AND ol_o_id = 2101",
    );
    let pending_before = db.count("new_order");

    let input = DeliveryInput {
        w_id: 1,
        o_carrier_id: 7,
    };
    assert_eq!(
        workloader.execute_delivery(&mut state, &input).unwrap(),
        TxnOutcome::Committed
    );

    assert_eq!(db.count("new_order"), pending_before - 10);
    assert_eq!(db.scalar_i64("SELECT MIN(no_o_id) FROM new_order"), 2102);
    assert_eq!(
        db.scalar_i64("SELECT COUNT(*) FROM orders WHERE o_id = 2101 AND o_carrier_id = 7"),
        10
    );
    assert_eq!(
        db.scalar_i64(
            "SELECT COUNT(*) FROM order_line WHERE ol_o_id = 2101 AND ol_delivery_d IS NULL"
        ),
        0
    );
    assert_cents(
        db.scalar_f64(&format!(
            "SELECT c_balance FROM customer WHERE c_w_id = 1 AND c_d_id = 6 AND c_id = {}",
            c_id
        )),
        -10.0 + amount,
    );
    assert_eq!(
        db.scalar_i64(&format!(
            "SELECT c_delivery_cnt FROM customer WHERE c_w_id = 1 AND c_d_id = 6 AND c_id = {}",
            c_id
        )),
        1
    );
}

#[test]
fn delivery_skips_districts_without_pending_orders() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    db.exec("DELETE FROM new_order WHERE no_w_id = 1 AND no_d_id = 3");
    let pending_before = db.count("new_order");

    let input = DeliveryInput {
        w_id: 1,
        o_carrier_id: 2,
    };
    workloader.execute_delivery(&mut state, &input).unwrap();

    assert_eq!(db.count("new_order"), pending_before - 9);
    assert_eq!(
        db.scalar_i64(
            "SELECT COUNT(*) FROM orders WHERE o_w_id = 1 AND o_d_id = 3 AND o_carrier_id = 2"
        ),
        0
    );
    assert_eq!(
        db.scalar_i64("SELECT SUM(c_delivery_cnt) FROM customer WHERE c_w_id = 1 AND c_d_id = 3"),
        0
    );
}

#[test]
fn delivery_with_nothing_pending_commits() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    db.exec("DELETE FROM new_order");

    let input = DeliveryInput {
        w_id: 1,
        o_carrier_id: 1,
    };
    assert_eq!(
        workloader.execute_delivery(&mut state, &input).unwrap(),
        TxnOutcome::Committed
    );
    assert_eq!(db.scalar_i64("SELECT SUM(c_delivery_cnt) FROM customer"), 0);
}

// ============================================================================
// Reconnection
// ============================================================================

#[test]
fn statements_survive_many_transactions() {
    let db = TestDb::loaded();
    let workloader = db.workloader();
    let mut state = worker(&workloader);
    for i in 0..20 {
        let ids: Vec<i64> = (1..=5).map(|k| i * 5 + k + 100).collect();
        workloader
            .execute_new_order(&mut state, &order_input(&ids))
            .unwrap();
    }
    assert!(state.has_statements());
    assert_eq!(
        db.scalar_i64("SELECT d_next_o_id FROM district WHERE d_w_id = 1 AND d_id = 1"),
        3021
    );
    workloader.cleanup_thread(state).unwrap();
}
