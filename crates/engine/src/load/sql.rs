//! Loading through multi-row INSERT statements

use super::rows::insert;
use super::{
    fill_customers, fill_districts, fill_history, fill_items, fill_new_orders, fill_order_lines,
    fill_orders, fill_stock, fill_warehouse, TpccLoader,
};
use crate::state::ThreadState;
use crate::tpcc::Workloader;
use tpcc_core::{RandomGenerator, Result};
use tpcc_load::SqlBatchLoader;
use tracing::info;

impl Workloader {
    /// The worker's RNG and a batch loader on its connection, borrowed together
    fn sql_sink<'s>(
        &self,
        state: &'s mut ThreadState,
        insert_hint: &str,
    ) -> (&'s mut RandomGenerator, SqlBatchLoader<'s>) {
        let ThreadState { rng, conn, .. } = state;
        let sink = SqlBatchLoader::new(conn.as_mut(), insert_hint).with_retry(
            self.cfg.prepare_retry_count,
            self.cfg.prepare_retry_interval(),
        );
        (rng, sink)
    }
}

impl TpccLoader for Workloader {
    type State = ThreadState;

    fn load_item(&self, state: &mut ThreadState) -> Result<()> {
        info!(target: "tpcc::load", "load to item");
        let (rng, mut sink) = self.sql_sink(state, insert::ITEM);
        fill_items(rng, &mut sink)
    }

    fn load_warehouse(&self, state: &mut ThreadState, w_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, "load to warehouse");
        let (rng, mut sink) = self.sql_sink(state, insert::WAREHOUSE);
        fill_warehouse(rng, &mut sink, w_id)
    }

    fn load_stock(&self, state: &mut ThreadState, w_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, "load to stock");
        let (rng, mut sink) = self.sql_sink(state, insert::STOCK);
        fill_stock(rng, &mut sink, w_id)
    }

    fn load_district(&self, state: &mut ThreadState, w_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, "load to district");
        let (rng, mut sink) = self.sql_sink(state, insert::DISTRICT);
        fill_districts(rng, &mut sink, w_id)
    }

    fn load_customer(&self, state: &mut ThreadState, w_id: i64, d_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to customer");
        let (rng, mut sink) = self.sql_sink(state, insert::CUSTOMER);
        fill_customers(rng, &mut sink, w_id, d_id, &self.init_load_time)
    }

    fn load_history(&self, state: &mut ThreadState, w_id: i64, d_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to history");
        let (rng, mut sink) = self.sql_sink(state, insert::HISTORY);
        fill_history(rng, &mut sink, w_id, d_id, &self.init_load_time)
    }

    fn load_order(&self, state: &mut ThreadState, w_id: i64, d_id: i64) -> Result<Vec<i64>> {
        info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to orders");
        let (rng, mut sink) = self.sql_sink(state, insert::ORDERS);
        fill_orders(rng, &mut sink, w_id, d_id, &self.init_load_time)
    }

    fn load_new_order(&self, state: &mut ThreadState, w_id: i64, d_id: i64) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to new_order");
        let (_, mut sink) = self.sql_sink(state, insert::NEW_ORDER);
        fill_new_orders(&mut sink, w_id, d_id)
    }

    fn load_order_line(
        &self,
        state: &mut ThreadState,
        w_id: i64,
        d_id: i64,
        ol_cnts: &[i64],
    ) -> Result<()> {
        info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to order_line");
        let (rng, mut sink) = self.sql_sink(state, insert::ORDER_LINE);
        fill_order_lines(rng, &mut sink, w_id, d_id, ol_cnts, &self.init_load_time)
    }
}
