//! Consistency conditions (TPC-C clause 3.3.2)
//!
//! Every condition is one read-only query, parameterized by the warehouse,
//! whose first column must be zero on every returned row: either a difference
//! or a count of violating rows. Money comparisons go through `ROUND(x, 2)`
//! so float-backed engines compare cents. A customer without delivered
//! orders has a delivered amount of zero, not NULL, so its balance is still
//! verified.
//!
//! Condition 3.3.2.11 only holds until the first Delivery, so it runs only
//! when all conditions are requested (after loading, or with `check_all`).

use tpcc_core::{CancelToken, Error, Result, SqlResultExt};
use tpcc_sql::{Connection, Dialect, SqlValue};
use tracing::info;

/// One consistency condition
#[derive(Debug, Clone)]
pub struct Condition {
    /// Clause number, "3.3.2.1" ..= "3.3.2.12"
    pub id: &'static str,
    /// Expression reported when the condition fails
    pub description: &'static str,
    /// Query text
    pub sql: String,
    /// Number of `?` placeholders, all bound to the warehouse
    pub params: usize,
}

impl Condition {
    fn new(id: &'static str, description: &'static str, sql: String, params: usize) -> Self {
        Self {
            id,
            description,
            sql,
            params,
        }
    }
}

/// Conditions in clause order; 3.3.2.11 is included only with `all`
pub fn conditions(dialect: Dialect, all: bool) -> Vec<Condition> {
    let join = dialect.straight_join();
    let mut list = vec![
        Condition::new(
            "3.3.2.1",
            "sum(d_ytd) - max(w_ytd)",
            "SELECT ROUND(SUM(d_ytd) - MAX(w_ytd), 2) diff FROM district, warehouse \
             WHERE d_w_id = w_id AND w_id = ? GROUP BY d_w_id"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.2",
            "(d_next_o_id - 1 - max(o_id))^2 + (d_next_o_id - 1 - max(no_o_id))^2",
            "SELECT (d_next_o_id - 1 - mo) * (d_next_o_id - 1 - mo) \
             + (d_next_o_id - 1 - mno) * (d_next_o_id - 1 - mno) diff \
             FROM district dis, \
             (SELECT o_d_id, MAX(o_id) mo FROM orders WHERE o_w_id = ? GROUP BY o_d_id) q, \
             (SELECT no_d_id, MAX(no_o_id) mno FROM new_order WHERE no_w_id = ? GROUP BY no_d_id) nq \
             WHERE d_w_id = ? AND q.o_d_id = dis.d_id AND nq.no_d_id = dis.d_id"
                .to_string(),
            3,
        ),
        Condition::new(
            "3.3.2.3",
            "max(no_o_id) - min(no_o_id) + 1 - count(*)",
            "SELECT MAX(no_o_id) - MIN(no_o_id) + 1 - COUNT(*) diff FROM new_order \
             WHERE no_w_id = ? GROUP BY no_d_id"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.4",
            "count of districts where sum(o_ol_cnt) != count(order_line)",
            "SELECT COUNT(*) FROM (SELECT o_d_id, SUM(o_ol_cnt) sm1, MAX(cn) AS cn FROM orders, \
             (SELECT ol_d_id, COUNT(*) cn FROM order_line WHERE ol_w_id = ? GROUP BY ol_d_id) ol \
             WHERE o_w_id = ? AND ol_d_id = o_d_id GROUP BY o_d_id) t1 WHERE sm1 <> cn"
                .to_string(),
            2,
        ),
        Condition::new(
            "3.3.2.5",
            "count of orders whose carrier disagrees with their new_order row",
            "SELECT COUNT(*) FROM orders LEFT JOIN new_order \
             ON (no_w_id = o_w_id AND o_d_id = no_d_id AND o_id = no_o_id) \
             WHERE o_w_id = ? AND ((o_carrier_id IS NULL AND no_o_id IS NULL) \
             OR (o_carrier_id IS NOT NULL AND no_o_id IS NOT NULL))"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.6",
            "count of orders where o_ol_cnt != count(order_line)",
            "SELECT COUNT(*) FROM (SELECT o_ol_cnt, order_line_count FROM orders \
             LEFT JOIN (SELECT ol_w_id, ol_d_id, ol_o_id, COUNT(*) order_line_count FROM order_line \
             GROUP BY ol_w_id, ol_d_id, ol_o_id) AS ol \
             ON orders.o_w_id = ol.ol_w_id AND orders.o_d_id = ol.ol_d_id AND orders.o_id = ol.ol_o_id \
             WHERE orders.o_w_id = ?) AS t WHERE t.o_ol_cnt != t.order_line_count"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.7",
            "count of order lines whose delivery date disagrees with the order carrier",
            "SELECT COUNT(*) FROM orders, order_line WHERE o_id = ol_o_id AND o_d_id = ol_d_id \
             AND ol_w_id = o_w_id AND o_w_id = ? AND ((ol_delivery_d IS NULL AND o_carrier_id IS NOT NULL) \
             OR (o_carrier_id IS NULL AND ol_delivery_d IS NOT NULL))"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.8",
            "count of warehouses where w_ytd != sum(h_amount)",
            "SELECT COUNT(*) cn FROM (SELECT w_id, w_ytd, SUM(h_amount) sm FROM history, warehouse \
             WHERE h_w_id = w_id AND w_id = ? GROUP BY w_id, w_ytd) t1 \
             WHERE ROUND(w_ytd, 2) <> ROUND(sm, 2)"
                .to_string(),
            1,
        ),
        Condition::new(
            "3.3.2.9",
            "count of districts where d_ytd != sum(h_amount)",
            "SELECT COUNT(*) FROM \
             (SELECT d_id, d_w_id, SUM(d_ytd) s1 FROM district GROUP BY d_id, d_w_id) d, \
             (SELECT h_d_id, h_w_id, SUM(h_amount) s2 FROM history WHERE h_w_id = ? \
             GROUP BY h_d_id, h_w_id) h \
             WHERE h_d_id = d_id AND d_w_id = h_w_id AND d_w_id = ? AND ROUND(s1, 2) <> ROUND(s2, 2)"
                .to_string(),
            2,
        ),
        Condition::new(
            "3.3.2.10",
            "count of customers where c_balance != sum(delivered ol_amount) - sum(h_amount)",
            format!(
                "SELECT COUNT(*) FROM (SELECT c.c_id, c.c_d_id, c.c_w_id, c.c_balance c1, \
                 (SELECT SUM(ol_amount) FROM orders {join} order_line \
                 WHERE ol_w_id = o_w_id AND ol_d_id = o_d_id AND ol_o_id = o_id \
                 AND ol_delivery_d IS NOT NULL AND o_w_id = ? AND o_d_id = c.c_d_id \
                 AND o_c_id = c.c_id) sm, \
                 (SELECT SUM(h_amount) FROM history WHERE h_c_w_id = ? AND h_c_d_id = c.c_d_id \
                 AND h_c_id = c.c_id) smh \
                 FROM customer c WHERE c.c_w_id = ?) t \
                 WHERE ROUND(c1, 2) <> ROUND(COALESCE(sm, 0) - COALESCE(smh, 0), 2)",
                join = join
            ),
            3,
        ),
    ];
    if all {
        list.push(Condition::new(
            "3.3.2.11",
            "count of districts where count(orders) - count(new_order) != 2100",
            "SELECT COUNT(*) FROM (SELECT * FROM \
             (SELECT o_w_id, o_d_id, COUNT(*) order_count FROM orders GROUP BY o_w_id, o_d_id) oc \
             JOIN (SELECT no_w_id, no_d_id, COUNT(*) new_order_count FROM new_order \
             GROUP BY no_w_id, no_d_id) nc ON oc.o_w_id = nc.no_w_id AND oc.o_d_id = nc.no_d_id) onc \
             JOIN (SELECT c_w_id, c_d_id, COUNT(*) customer_count FROM customer \
             GROUP BY c_w_id, c_d_id) cc ON onc.no_w_id = cc.c_w_id AND onc.no_d_id = cc.c_d_id \
             WHERE c_w_id = ? AND order_count - 2100 != new_order_count"
                .to_string(),
            1,
        ));
    }
    list.push(Condition::new(
        "3.3.2.12",
        "count of customers where c_balance + c_ytd_payment != sum(delivered ol_amount)",
        format!(
            "SELECT COUNT(*) FROM (SELECT c.c_id, c.c_d_id, c.c_balance c1, c_ytd_payment, \
             (SELECT SUM(ol_amount) FROM orders {join} order_line \
             WHERE ol_w_id = o_w_id AND ol_d_id = o_d_id AND ol_o_id = o_id \
             AND ol_delivery_d IS NOT NULL AND o_w_id = ? AND o_d_id = c.c_d_id \
             AND o_c_id = c.c_id) sm FROM customer c WHERE c.c_w_id = ?) t1 \
             WHERE ROUND(c1 + c_ytd_payment, 2) <> ROUND(COALESCE(sm, 0), 2)",
            join = join
        ),
        2,
    ));
    list
}

/// Evaluate one condition against one warehouse
pub fn check_condition(conn: &mut dyn Connection, condition: &Condition, warehouse: u32) -> Result<()> {
    let params = vec![SqlValue::from(warehouse); condition.params];
    let rows = conn.query_sql(&condition.sql, &params).with_query(&condition.sql)?;
    for row in rows {
        if row.is_null(0) {
            continue;
        }
        let value = row.get_f64(0)?;
        if value != 0.0 {
            return Err(Error::CheckFailed {
                warehouse,
                condition: condition.id,
                detail: format!("{} should be 0, but got {}", condition.description, value),
            });
        }
    }
    Ok(())
}

/// Warehouses checked by `thread_id` out of `threads`
pub fn warehouses_for_thread(thread_id: usize, threads: usize, warehouses: u32) -> impl Iterator<Item = u32> {
    let threads = threads.max(1);
    (thread_id % threads..warehouses as usize)
        .step_by(threads)
        .map(|i| i as u32 + 1)
}

/// Evaluate `conditions` for every warehouse assigned to `thread_id`
pub fn check_warehouses(
    conn: &mut dyn Connection,
    conditions: &[Condition],
    thread_id: usize,
    threads: usize,
    warehouses: u32,
    cancel: &CancelToken,
) -> Result<()> {
    for warehouse in warehouses_for_thread(thread_id, threads, warehouses) {
        for condition in conditions {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            info!(
                target: "tpcc::check",
                warehouse,
                condition = condition.id,
                "begin to check warehouse"
            );
            check_condition(conn, condition, warehouse)?;
        }
    }
    Ok(())
}
