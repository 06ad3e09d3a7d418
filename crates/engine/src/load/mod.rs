//! Initial population
//!
//! `TpccLoader` is implemented by both façades: the SQL workloader inserts
//! through `SqlBatchLoader`, the CSV workloader writes through
//! `CsvBatchLoader`. `prepare_workload` decides which thread loads what:
//!
//! - thread 0 loads the item table
//! - warehouse-scoped tables (warehouse, stock, district) go to thread
//!   `(w - 1) % threads`
//! - district-scoped tables (customer, history, orders, new_order,
//!   order_line) are striped over the flattened `warehouses * 10` district
//!   space, so every district is loaded by exactly one thread
//!
//! The `fill_*` functions stream generated rows of one table into any
//! `BatchLoader` and flush it.

pub mod rows;
mod sql;

use tpcc_core::schema::{
    CUSTOMERS_PER_DISTRICT, DISTRICTS_PER_WAREHOUSE, FIRST_UNDELIVERED_ORDER, MAX_ITEMS,
    ORDERS_PER_DISTRICT, STOCK_PER_WAREHOUSE,
};
use tpcc_core::{CancelToken, Error, RandomGenerator, Result};
use tpcc_load::BatchLoader;

/// Per-table load operations of one worker
pub trait TpccLoader {
    /// Worker-owned state passed to every call
    type State;

    /// The item table (thread 0 only)
    fn load_item(&self, state: &mut Self::State) -> Result<()>;
    /// One warehouse row
    fn load_warehouse(&self, state: &mut Self::State, w_id: i64) -> Result<()>;
    /// The stock of one warehouse
    fn load_stock(&self, state: &mut Self::State, w_id: i64) -> Result<()>;
    /// The districts of one warehouse
    fn load_district(&self, state: &mut Self::State, w_id: i64) -> Result<()>;
    /// The customers of one district
    fn load_customer(&self, state: &mut Self::State, w_id: i64, d_id: i64) -> Result<()>;
    /// One history row per customer of one district
    fn load_history(&self, state: &mut Self::State, w_id: i64, d_id: i64) -> Result<()>;
    /// The orders of one district; returns each order's line count in
    /// order-id order
    fn load_order(&self, state: &mut Self::State, w_id: i64, d_id: i64) -> Result<Vec<i64>>;
    /// The undelivered orders of one district
    fn load_new_order(&self, state: &mut Self::State, w_id: i64, d_id: i64) -> Result<()>;
    /// The order lines of one district, `ol_cnts` as returned by `load_order`
    fn load_order_line(
        &self,
        state: &mut Self::State,
        w_id: i64,
        d_id: i64,
        ol_cnts: &[i64],
    ) -> Result<()>;
}

fn ensure_running(cancel: &CancelToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// Load this thread's share of the initial population
pub fn prepare_workload<L: TpccLoader>(
    loader: &L,
    state: &mut L::State,
    cancel: &CancelToken,
    warehouses: u32,
    threads: usize,
    thread_id: usize,
) -> Result<()> {
    let threads = threads.max(1);
    if thread_id == 0 {
        ensure_running(cancel)?;
        loader.load_item(state)?;
    }

    for i in (0..warehouses as usize).filter(|i| i % threads == thread_id) {
        let w_id = i as i64 + 1;
        ensure_running(cancel)?;
        loader.load_warehouse(state, w_id)?;
        ensure_running(cancel)?;
        loader.load_stock(state, w_id)?;
        ensure_running(cancel)?;
        loader.load_district(state, w_id)?;
    }

    let districts = warehouses as usize * DISTRICTS_PER_WAREHOUSE as usize;
    for i in (0..districts).filter(|i| i % threads == thread_id) {
        let w_id = (i / DISTRICTS_PER_WAREHOUSE as usize) as i64 + 1;
        let d_id = (i % DISTRICTS_PER_WAREHOUSE as usize) as i64 + 1;
        ensure_running(cancel)?;
        loader.load_customer(state, w_id, d_id)?;
        ensure_running(cancel)?;
        loader.load_history(state, w_id, d_id)?;
        ensure_running(cancel)?;
        let ol_cnts = loader.load_order(state, w_id, d_id)?;
        ensure_running(cancel)?;
        loader.load_new_order(state, w_id, d_id)?;
        ensure_running(cancel)?;
        loader.load_order_line(state, w_id, d_id, &ol_cnts)?;
    }
    Ok(())
}

// ============================================================================
// Table fill
// ============================================================================

pub(crate) fn fill_items(rng: &mut RandomGenerator, sink: &mut dyn BatchLoader) -> Result<()> {
    for i_id in 1..=MAX_ITEMS {
        sink.insert_value(&rows::item(rng, i_id))?;
    }
    sink.flush()
}

pub(crate) fn fill_warehouse(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
) -> Result<()> {
    sink.insert_value(&rows::warehouse(rng, w_id))?;
    sink.flush()
}

pub(crate) fn fill_stock(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
) -> Result<()> {
    for i_id in 1..=STOCK_PER_WAREHOUSE {
        sink.insert_value(&rows::stock(rng, w_id, i_id))?;
    }
    sink.flush()
}

pub(crate) fn fill_districts(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
) -> Result<()> {
    for d_id in 1..=DISTRICTS_PER_WAREHOUSE {
        sink.insert_value(&rows::district(rng, w_id, d_id))?;
    }
    sink.flush()
}

pub(crate) fn fill_customers(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
    d_id: i64,
    load_time: &str,
) -> Result<()> {
    for c_id in 1..=CUSTOMERS_PER_DISTRICT {
        sink.insert_value(&rows::customer(rng, w_id, d_id, c_id, load_time))?;
    }
    sink.flush()
}

pub(crate) fn fill_history(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
    d_id: i64,
    load_time: &str,
) -> Result<()> {
    for c_id in 1..=CUSTOMERS_PER_DISTRICT {
        sink.insert_value(&rows::history(rng, w_id, d_id, c_id, load_time))?;
    }
    sink.flush()
}

pub(crate) fn fill_orders(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
    d_id: i64,
    load_time: &str,
) -> Result<Vec<i64>> {
    let c_ids = rows::order_customer_ids(rng, ORDERS_PER_DISTRICT as usize);
    let mut ol_cnts = Vec::with_capacity(c_ids.len());
    for (i, c_id) in c_ids.into_iter().enumerate() {
        let (row, ol_cnt) = rows::order(rng, w_id, d_id, i as i64 + 1, c_id, load_time);
        sink.insert_value(&row)?;
        ol_cnts.push(ol_cnt);
    }
    sink.flush()?;
    Ok(ol_cnts)
}

pub(crate) fn fill_new_orders(sink: &mut dyn BatchLoader, w_id: i64, d_id: i64) -> Result<()> {
    for o_id in FIRST_UNDELIVERED_ORDER..=ORDERS_PER_DISTRICT {
        sink.insert_value(&rows::new_order(w_id, d_id, o_id))?;
    }
    sink.flush()
}

pub(crate) fn fill_order_lines(
    rng: &mut RandomGenerator,
    sink: &mut dyn BatchLoader,
    w_id: i64,
    d_id: i64,
    ol_cnts: &[i64],
    load_time: &str,
) -> Result<()> {
    for (i, ol_cnt) in ol_cnts.iter().enumerate() {
        let o_id = i as i64 + 1;
        for number in 1..=*ol_cnt {
            sink.insert_value(&rows::order_line(rng, w_id, d_id, o_id, number, load_time))?;
        }
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use tpcc_core::NuRandConstants;
    use tpcc_sql::SqlValue;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Call {
        Item,
        Warehouse(i64),
        Stock(i64),
        District(i64),
        Customer(i64, i64),
        History(i64, i64),
        Order(i64, i64),
        NewOrder(i64, i64),
        OrderLine(i64, i64, usize),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl TpccLoader for Recorder {
        type State = usize;

        fn load_item(&self, _: &mut usize) -> Result<()> {
            self.calls.lock().push(Call::Item);
            Ok(())
        }
        fn load_warehouse(&self, _: &mut usize, w: i64) -> Result<()> {
            self.calls.lock().push(Call::Warehouse(w));
            Ok(())
        }
        fn load_stock(&self, _: &mut usize, w: i64) -> Result<()> {
            self.calls.lock().push(Call::Stock(w));
            Ok(())
        }
        fn load_district(&self, _: &mut usize, w: i64) -> Result<()> {
            self.calls.lock().push(Call::District(w));
            Ok(())
        }
        fn load_customer(&self, _: &mut usize, w: i64, d: i64) -> Result<()> {
            self.calls.lock().push(Call::Customer(w, d));
            Ok(())
        }
        fn load_history(&self, _: &mut usize, w: i64, d: i64) -> Result<()> {
            self.calls.lock().push(Call::History(w, d));
            Ok(())
        }
        fn load_order(&self, _: &mut usize, w: i64, d: i64) -> Result<Vec<i64>> {
            self.calls.lock().push(Call::Order(w, d));
            Ok(vec![5, 6, 7])
        }
        fn load_new_order(&self, _: &mut usize, w: i64, d: i64) -> Result<()> {
            self.calls.lock().push(Call::NewOrder(w, d));
            Ok(())
        }
        fn load_order_line(&self, _: &mut usize, w: i64, d: i64, cnts: &[i64]) -> Result<()> {
            self.calls.lock().push(Call::OrderLine(w, d, cnts.len()));
            Ok(())
        }
    }

    fn run_all(warehouses: u32, threads: usize) -> Vec<Call> {
        let recorder = Recorder::default();
        let cancel = CancelToken::new();
        for thread_id in 0..threads {
            let mut state = thread_id;
            prepare_workload(&recorder, &mut state, &cancel, warehouses, threads, thread_id).unwrap();
        }
        let mut calls = recorder.calls.into_inner();
        calls.sort();
        calls
    }

    #[test]
    fn test_items_loaded_once_by_thread_zero() {
        let recorder = Recorder::default();
        let cancel = CancelToken::new();
        let mut state = 1;
        prepare_workload(&recorder, &mut state, &cancel, 3, 2, 1).unwrap();
        assert!(!recorder.calls.lock().contains(&Call::Item));
    }

    #[test]
    fn test_district_striping_is_flattened() {
        let recorder = Recorder::default();
        let cancel = CancelToken::new();
        let mut state = 3;
        prepare_workload(&recorder, &mut state, &cancel, 2, 4, 3).unwrap();
        let customers: Vec<_> = recorder
            .calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Customer(w, d) => Some((*w, *d)),
                _ => None,
            })
            .collect();
        assert_eq!(customers, vec![(1, 4), (1, 8), (2, 2), (2, 6), (2, 10)]);
    }

    #[test]
    fn test_cancelled_load_stops() {
        let recorder = Recorder::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut state = 0;
        let err = prepare_workload(&recorder, &mut state, &cancel, 1, 1, 0).unwrap_err();
        assert!(err.is_cancelled());
        assert!(recorder.calls.lock().is_empty());
    }

    proptest! {
        #[test]
        fn prop_every_unit_loaded_exactly_once(warehouses in 1u32..6, threads in 1usize..7) {
            let calls = run_all(warehouses, threads);
            let mut expected = vec![Call::Item];
            for w in 1..=warehouses as i64 {
                expected.push(Call::Warehouse(w));
                expected.push(Call::Stock(w));
                expected.push(Call::District(w));
                for d in 1..=10 {
                    expected.push(Call::Customer(w, d));
                    expected.push(Call::History(w, d));
                    expected.push(Call::Order(w, d));
                    expected.push(Call::NewOrder(w, d));
                    expected.push(Call::OrderLine(w, d, 3));
                }
            }
            expected.sort();
            prop_assert_eq!(calls, expected);
        }
    }

    #[derive(Default)]
    struct Collect {
        rows: Vec<Vec<SqlValue>>,
        flushes: usize,
    }

    impl BatchLoader for Collect {
        fn insert_value(&mut self, row: &[SqlValue]) -> Result<()> {
            self.rows.push(row.to_vec());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_order_lines_follow_order_counts() {
        let mut rng = RandomGenerator::new(NuRandConstants::from_seed(Some(2)), Some(2));
        let mut orders = Collect::default();
        let ol_cnts = fill_orders(&mut rng, &mut orders, 1, 1, "t").unwrap();
        assert_eq!(orders.rows.len(), ORDERS_PER_DISTRICT as usize);
        assert_eq!(orders.flushes, 1);

        let mut lines = Collect::default();
        fill_order_lines(&mut rng, &mut lines, 1, 1, &ol_cnts, "t").unwrap();
        assert_eq!(lines.rows.len() as i64, ol_cnts.iter().sum::<i64>());
    }

    #[test]
    fn test_new_orders_cover_undelivered_range() {
        let mut sink = Collect::default();
        fill_new_orders(&mut sink, 2, 3).unwrap();
        assert_eq!(sink.rows.len(), 900);
        assert_eq!(sink.rows[0][0], SqlValue::Int(FIRST_UNDELIVERED_ORDER));
    }
}
