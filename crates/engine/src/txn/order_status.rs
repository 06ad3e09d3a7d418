//! OrderStatus: read a customer's balance and most recent order

use super::{pick_middle, query, query_one, CustomerSelector, Prepared, TxnOutcome};
use tpcc_core::{RandomGenerator, Result};
use tpcc_sql::{Connection, Transaction, TxOptions};
use tracing::trace;

/// OrderStatus input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusInput {
    /// Warehouse
    pub w_id: i64,
    /// District
    pub d_id: i64,
    /// Customer lookup
    pub customer: CustomerSelector,
}

impl OrderStatusInput {
    /// Draw an input against `warehouses` warehouses
    pub fn generate(rng: &mut RandomGenerator, warehouses: u32) -> Self {
        let w_id = rng.rand_int(1, i64::from(warehouses));
        let d_id = rng.rand_int(1, 10);
        Self {
            w_id,
            d_id,
            customer: CustomerSelector::generate(rng),
        }
    }
}

const SELECT_CUSTOMER_BY_LAST: &str = "SELECT c_balance, c_first, c_middle, c_id FROM customer \
    WHERE c_w_id = ? AND c_d_id = ? AND c_last = ? ORDER BY c_first";
const SELECT_CUSTOMER_BY_ID: &str = "SELECT c_balance, c_first, c_middle, c_last FROM customer \
    WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";
const SELECT_LATEST_ORDER: &str = "SELECT o_id, o_carrier_id, o_entry_d FROM orders \
    WHERE o_w_id = ? AND o_d_id = ? AND o_c_id = ? ORDER BY o_id DESC LIMIT 1";
const SELECT_ORDER_LINES: &str = "SELECT ol_i_id, ol_supply_w_id, ol_quantity, ol_amount, \
    ol_delivery_d FROM order_line WHERE ol_w_id = ? AND ol_d_id = ? AND ol_o_id = ?";

#[derive(Debug)]
pub(crate) struct OrderStatusStatements {
    select_customer_by_last: Prepared,
    select_customer_by_id: Prepared,
    select_latest_order: Prepared,
    select_order_lines: Prepared,
}

impl OrderStatusStatements {
    pub(crate) fn prepare(conn: &mut dyn Connection) -> Result<Self> {
        Ok(Self {
            select_customer_by_last: Prepared::new(conn, SELECT_CUSTOMER_BY_LAST.to_string())?,
            select_customer_by_id: Prepared::new(conn, SELECT_CUSTOMER_BY_ID.to_string())?,
            select_latest_order: Prepared::new(conn, SELECT_LATEST_ORDER.to_string())?,
            select_order_lines: Prepared::new(conn, SELECT_ORDER_LINES.to_string())?,
        })
    }
}

pub(crate) fn execute(
    conn: &mut dyn Connection,
    stmts: &OrderStatusStatements,
    opts: TxOptions,
    input: &OrderStatusInput,
) -> Result<TxnOutcome> {
    let (w_id, d_id) = (input.w_id, input.d_id);
    let mut tx = Transaction::begin(conn, opts)?;

    let c_id = match &input.customer {
        CustomerSelector::ById(c_id) => {
            query_one(
                &mut tx,
                &stmts.select_customer_by_id,
                &[w_id.into(), d_id.into(), (*c_id).into()],
                || format!("customer ({}, {}, {})", w_id, d_id, c_id),
            )?;
            *c_id
        }
        CustomerSelector::ByLastName(last) => {
            let rows = query(
                &mut tx,
                &stmts.select_customer_by_last,
                &[w_id.into(), d_id.into(), last.as_str().into()],
            )?;
            pick_middle(rows, || format!("customer ({}, {}) named {}", w_id, d_id, last))?
                .get_i64(3)?
        }
    };

    let order = query_one(
        &mut tx,
        &stmts.select_latest_order,
        &[w_id.into(), d_id.into(), c_id.into()],
        || format!("latest order of customer ({}, {}, {})", w_id, d_id, c_id),
    )?;
    let o_id = order.get_i64(0)?;
    let lines = query(
        &mut tx,
        &stmts.select_order_lines,
        &[w_id.into(), d_id.into(), o_id.into()],
    )?;
    trace!(target: "tpcc::txn", w_id, d_id, c_id, o_id, lines = lines.len(), "order_status");

    tx.commit()?;
    Ok(TxnOutcome::Committed)
}
