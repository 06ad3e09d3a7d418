//! StockLevel: count distinct items of the last 20 orders below a threshold

use super::{query_one, Prepared, TxnOutcome};
use tpcc_core::{RandomGenerator, Result};
use tpcc_sql::{Connection, Transaction, TxOptions};
use tracing::trace;

/// StockLevel input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevelInput {
    /// Warehouse
    pub w_id: i64,
    /// District
    pub d_id: i64,
    /// Quantity threshold, 10..=20
    pub threshold: i64,
}

impl StockLevelInput {
    /// Draw an input against `warehouses` warehouses
    pub fn generate(rng: &mut RandomGenerator, warehouses: u32) -> Self {
        Self {
            w_id: rng.rand_int(1, i64::from(warehouses)),
            d_id: rng.rand_int(1, 10),
            threshold: rng.rand_int(10, 20),
        }
    }
}

const SELECT_DISTRICT: &str = "SELECT d_next_o_id FROM district WHERE d_w_id = ? AND d_id = ?";
const COUNT_LOW_STOCK: &str = "SELECT COUNT(DISTINCT (s_i_id)) FROM order_line, stock \
    WHERE ol_w_id = ? AND ol_d_id = ? AND ol_o_id < ? AND ol_o_id >= ? - 20 \
    AND s_w_id = ? AND s_i_id = ol_i_id AND s_quantity < ?";

#[derive(Debug)]
pub(crate) struct StockLevelStatements {
    select_district: Prepared,
    count_low_stock: Prepared,
}

impl StockLevelStatements {
    pub(crate) fn prepare(conn: &mut dyn Connection) -> Result<Self> {
        Ok(Self {
            select_district: Prepared::new(conn, SELECT_DISTRICT.to_string())?,
            count_low_stock: Prepared::new(conn, COUNT_LOW_STOCK.to_string())?,
        })
    }
}

pub(crate) fn execute(
    conn: &mut dyn Connection,
    stmts: &StockLevelStatements,
    opts: TxOptions,
    input: &StockLevelInput,
) -> Result<TxnOutcome> {
    let (w_id, d_id) = (input.w_id, input.d_id);
    let mut tx = Transaction::begin(conn, opts)?;

    let district = query_one(
        &mut tx,
        &stmts.select_district,
        &[w_id.into(), d_id.into()],
        || format!("district ({}, {})", w_id, d_id),
    )?;
    let next_o_id = district.get_i64(0)?;

    let count = query_one(
        &mut tx,
        &stmts.count_low_stock,
        &[
            w_id.into(),
            d_id.into(),
            next_o_id.into(),
            next_o_id.into(),
            w_id.into(),
            input.threshold.into(),
        ],
        || format!("stock count of district ({}, {})", w_id, d_id),
    )?
    .get_i64(0)?;
    trace!(target: "tpcc::txn", w_id, d_id, threshold = input.threshold, count, "stock_level");

    tx.commit()?;
    Ok(TxnOutcome::Committed)
}
