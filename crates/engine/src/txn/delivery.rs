//! Delivery: deliver the oldest undelivered order of every district of a
//! warehouse in one batch
//!
//! The per-district work is expressed as set statements over ten
//! `(w_id, d_id, o_id)` tuples. Districts without pending orders get
//! `o_id = 0`, which matches no row; their customer update is skipped.

use super::{exec, query, Prepared, TxnOutcome};
use tpcc_core::schema::DISTRICTS_PER_WAREHOUSE;
use tpcc_core::{RandomGenerator, Result};
use tpcc_sql::{Connection, Dialect, SqlValue, Transaction, TxOptions};
use tracing::trace;

const DISTRICTS: usize = DISTRICTS_PER_WAREHOUSE as usize;

/// Delivery input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryInput {
    /// Warehouse
    pub w_id: i64,
    /// Carrier, 1..=10
    pub o_carrier_id: i64,
}

impl DeliveryInput {
    /// Draw an input against `warehouses` warehouses
    pub fn generate(rng: &mut RandomGenerator, warehouses: u32) -> Self {
        Self {
            w_id: rng.rand_int(1, i64::from(warehouses)),
            o_carrier_id: rng.rand_int(1, 10),
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

const SELECT_NEW_ORDERS: &str = "SELECT no_d_id, MIN(no_o_id) FROM new_order \
    WHERE no_w_id = ? AND no_d_id IN (1,2,3,4,5,6,7,8,9,10) GROUP BY no_d_id";
const UPDATE_CUSTOMER: &str = "UPDATE customer SET c_balance = c_balance + ?, \
    c_delivery_cnt = c_delivery_cnt + 1 WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";

fn delete_new_orders_sql(dialect: Dialect) -> String {
    format!(
        "DELETE FROM new_order WHERE (no_w_id, no_d_id, no_o_id) IN {}",
        dialect.row_values_in(3, DISTRICTS)
    )
}

fn update_orders_sql(dialect: Dialect) -> String {
    format!(
        "UPDATE orders SET o_carrier_id = ? WHERE (o_w_id, o_d_id, o_id) IN {}",
        dialect.row_values_in(3, DISTRICTS)
    )
}

fn select_orders_sql(dialect: Dialect) -> String {
    format!(
        "SELECT o_d_id, o_c_id FROM orders WHERE (o_w_id, o_d_id, o_id) IN {}",
        dialect.row_values_in(3, DISTRICTS)
    )
}

fn update_order_lines_sql(dialect: Dialect) -> String {
    format!(
        "UPDATE order_line SET ol_delivery_d = ? WHERE (ol_w_id, ol_d_id, ol_o_id) IN {}",
        dialect.row_values_in(3, DISTRICTS)
    )
}

fn sum_order_lines_sql(dialect: Dialect) -> String {
    format!(
        "SELECT ol_d_id, SUM(ol_amount) FROM order_line WHERE (ol_w_id, ol_d_id, ol_o_id) IN {} \
         GROUP BY ol_d_id",
        dialect.row_values_in(3, DISTRICTS)
    )
}

#[derive(Debug)]
pub(crate) struct DeliveryStatements {
    select_new_orders: Prepared,
    delete_new_orders: Prepared,
    update_orders: Prepared,
    select_orders: Prepared,
    update_order_lines: Prepared,
    sum_order_lines: Prepared,
    update_customer: Prepared,
}

impl DeliveryStatements {
    pub(crate) fn prepare(conn: &mut dyn Connection, dialect: Dialect) -> Result<Self> {
        Ok(Self {
            select_new_orders: Prepared::new(conn, dialect.locking_read(SELECT_NEW_ORDERS))?,
            delete_new_orders: Prepared::new(conn, delete_new_orders_sql(dialect))?,
            update_orders: Prepared::new(conn, update_orders_sql(dialect))?,
            select_orders: Prepared::new(conn, select_orders_sql(dialect))?,
            update_order_lines: Prepared::new(conn, update_order_lines_sql(dialect))?,
            sum_order_lines: Prepared::new(conn, sum_order_lines_sql(dialect))?,
            update_customer: Prepared::new(conn, UPDATE_CUSTOMER.to_string())?,
        })
    }
}

/// District slot of a `d_id` column value, if in range
fn district_slot(d_id: i64) -> Option<usize> {
    (1..=DISTRICTS_PER_WAREHOUSE)
        .contains(&d_id)
        .then(|| (d_id - 1) as usize)
}

// ============================================================================
// Execution
// ============================================================================

pub(crate) fn execute(
    conn: &mut dyn Connection,
    stmts: &DeliveryStatements,
    opts: TxOptions,
    input: &DeliveryInput,
    now: &str,
) -> Result<TxnOutcome> {
    let w_id = input.w_id;
    let mut tx = Transaction::begin(conn, opts)?;

    let mut oldest = [0i64; DISTRICTS];
    for row in query(&mut tx, &stmts.select_new_orders, &[w_id.into()])? {
        if let Some(slot) = district_slot(row.get_i64(0)?) {
            oldest[slot] = row.get_i64(1)?;
        }
    }
    if oldest.iter().all(|o_id| *o_id == 0) {
        tx.commit()?;
        trace!(target: "tpcc::txn", w_id, "delivery found no pending orders");
        return Ok(TxnOutcome::Committed);
    }

    let keys: Vec<SqlValue> = oldest
        .iter()
        .enumerate()
        .flat_map(|(slot, o_id)| {
            [
                SqlValue::from(w_id),
                SqlValue::from(slot as i64 + 1),
                SqlValue::from(*o_id),
            ]
        })
        .collect();
    let with_leading = |first: SqlValue| {
        let mut params = Vec::with_capacity(keys.len() + 1);
        params.push(first);
        params.extend(keys.iter().cloned());
        params
    };

    exec(&mut tx, &stmts.delete_new_orders, &keys)?;
    exec(
        &mut tx,
        &stmts.update_orders,
        &with_leading(input.o_carrier_id.into()),
    )?;

    let mut customers = [0i64; DISTRICTS];
    for row in query(&mut tx, &stmts.select_orders, &keys)? {
        if let Some(slot) = district_slot(row.get_i64(0)?) {
            customers[slot] = row.get_i64(1)?;
        }
    }

    exec(&mut tx, &stmts.update_order_lines, &with_leading(now.into()))?;

    let mut totals = [0f64; DISTRICTS];
    for row in query(&mut tx, &stmts.sum_order_lines, &keys)? {
        if let Some(slot) = district_slot(row.get_i64(0)?) {
            if !row.is_null(1) {
                totals[slot] = row.get_f64(1)?;
            }
        }
    }

    for slot in 0..DISTRICTS {
        if oldest[slot] == 0 {
            continue;
        }
        exec(
            &mut tx,
            &stmts.update_customer,
            &[
                totals[slot].into(),
                w_id.into(),
                (slot as i64 + 1).into(),
                customers[slot].into(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(TxnOutcome::Committed)
}
