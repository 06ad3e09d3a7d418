//! CSV workloader
//!
//! Generates the initial population into CSV files instead of a database.
//! Each worker writes its own files, `<db_name>.<table>.<thread_id>.csv`
//! under `output_dir`; the item table is written by worker 0 only. When a
//! connector is supplied, worker 0 also creates the schema so the files can
//! be bulk-imported afterwards.
//!
//! Only `prepare` does any work. The other phases are no-ops.

use crate::ddl::DdlManager;
use crate::load::{
    fill_customers, fill_districts, fill_history, fill_items, fill_new_orders, fill_order_lines,
    fill_orders, fill_stock, fill_warehouse, prepare_workload, TpccLoader,
};
use crate::tpcc::DdlGate;
use crate::workload::Workload;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tpcc_core::schema::now_timestamp;
use tpcc_core::{CancelToken, Config, Error, NuRandConstants, RandomGenerator, Result, Table};
use tpcc_load::{BatchLoader, CsvBatchLoader};
use tpcc_sql::{Connection, Connector};
use tracing::{info, warn};

/// Parse a comma-separated table list; empty means every table
pub fn parse_tables(specified: &str) -> Result<BTreeSet<Table>> {
    if specified.trim().is_empty() {
        return Ok(Table::ALL.iter().copied().collect());
    }
    let tables = specified
        .split(',')
        .map(|name| {
            name.trim().parse::<Table>().map_err(|_| {
                Error::InvalidConfig(format!(
                    "table {} is not supported, supported tables: item, customer, district, \
                     orders, new_order, order_line, history, warehouse, stock",
                    name.trim()
                ))
            })
        })
        .collect::<Result<BTreeSet<_>>>()?;
    if tables.contains(&Table::OrderLine) && !tables.contains(&Table::Orders) {
        return Err(Error::InvalidConfig(
            "table orders must be specified to generate table order_line".into(),
        ));
    }
    Ok(tables)
}

/// Per-worker state of the CSV workloader
pub struct CsvThreadState {
    thread_id: usize,
    rng: RandomGenerator,
    conn: Option<Box<dyn Connection>>,
    loaders: HashMap<Table, CsvBatchLoader>,
}

impl CsvThreadState {
    /// Files this worker writes to
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.loaders.values().map(|l| l.path().to_path_buf()).collect();
        files.sort();
        files
    }

    /// RNG and the loader of `table`; `None` when the worker does not write it
    fn sink(&mut self, table: Table) -> Option<(&mut RandomGenerator, &mut CsvBatchLoader)> {
        let rng = &mut self.rng;
        self.loaders.get_mut(&table).map(|sink| (rng, sink))
    }
}

/// TPC-C initial population written to CSV files
pub struct CsvWorkloader {
    cfg: Config,
    connector: Option<Arc<dyn Connector>>,
    ddl: Option<DdlManager>,
    tables: BTreeSet<Table>,
    constants: NuRandConstants,
    init_load_time: String,
    ddl_gate: DdlGate,
}

impl CsvWorkloader {
    /// Validate `cfg`, resolve the table selection and create `output_dir`
    pub fn new(connector: Option<Arc<dyn Connector>>, cfg: Config) -> Result<Self> {
        cfg.validate()?;
        let tables = parse_tables(&cfg.specified_tables)?;
        fs::create_dir_all(&cfg.output_dir)?;
        let ddl = connector.as_ref().map(|c| {
            DdlManager::new(
                cfg.parts,
                cfg.use_fk,
                cfg.warehouses,
                cfg.partition_type,
                c.dialect(),
            )
        });
        Ok(Self {
            constants: NuRandConstants::from_seed(cfg.seed),
            init_load_time: now_timestamp(),
            ddl_gate: DdlGate::default(),
            connector,
            ddl,
            tables,
            cfg,
        })
    }

    /// Tables this workloader generates
    pub fn tables(&self) -> &BTreeSet<Table> {
        &self.tables
    }

    fn file_path(&self, table: Table, thread_id: usize) -> PathBuf {
        self.cfg
            .output_dir
            .join(format!("{}.{}.{}.csv", self.cfg.db_name, table, thread_id))
    }
}

impl TpccLoader for CsvWorkloader {
    type State = CsvThreadState;

    fn load_item(&self, state: &mut CsvThreadState) -> Result<()> {
        match state.sink(Table::Item) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", "load to item");
                fill_items(rng, sink)
            }
            None => Ok(()),
        }
    }

    fn load_warehouse(&self, state: &mut CsvThreadState, w_id: i64) -> Result<()> {
        match state.sink(Table::Warehouse) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, "load to warehouse");
                fill_warehouse(rng, sink, w_id)
            }
            None => Ok(()),
        }
    }

    fn load_stock(&self, state: &mut CsvThreadState, w_id: i64) -> Result<()> {
        match state.sink(Table::Stock) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, "load to stock");
                fill_stock(rng, sink, w_id)
            }
            None => Ok(()),
        }
    }

    fn load_district(&self, state: &mut CsvThreadState, w_id: i64) -> Result<()> {
        match state.sink(Table::District) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, "load to district");
                fill_districts(rng, sink, w_id)
            }
            None => Ok(()),
        }
    }

    fn load_customer(&self, state: &mut CsvThreadState, w_id: i64, d_id: i64) -> Result<()> {
        match state.sink(Table::Customer) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to customer");
                fill_customers(rng, sink, w_id, d_id, &self.init_load_time)
            }
            None => Ok(()),
        }
    }

    fn load_history(&self, state: &mut CsvThreadState, w_id: i64, d_id: i64) -> Result<()> {
        match state.sink(Table::History) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to history");
                fill_history(rng, sink, w_id, d_id, &self.init_load_time)
            }
            None => Ok(()),
        }
    }

    fn load_order(&self, state: &mut CsvThreadState, w_id: i64, d_id: i64) -> Result<Vec<i64>> {
        match state.sink(Table::Orders) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to orders");
                fill_orders(rng, sink, w_id, d_id, &self.init_load_time)
            }
            None => Ok(Vec::new()),
        }
    }

    fn load_new_order(&self, state: &mut CsvThreadState, w_id: i64, d_id: i64) -> Result<()> {
        match state.sink(Table::NewOrder) {
            Some((_, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to new_order");
                fill_new_orders(sink, w_id, d_id)
            }
            None => Ok(()),
        }
    }

    fn load_order_line(
        &self,
        state: &mut CsvThreadState,
        w_id: i64,
        d_id: i64,
        ol_cnts: &[i64],
    ) -> Result<()> {
        match state.sink(Table::OrderLine) {
            Some((rng, sink)) => {
                info!(target: "tpcc::load", warehouse = w_id, district = d_id, "load to order_line");
                fill_order_lines(rng, sink, w_id, d_id, ol_cnts, &self.init_load_time)
            }
            None => Ok(()),
        }
    }
}

impl Workload for CsvWorkloader {
    type State = CsvThreadState;

    fn name(&self) -> &str {
        "tpcc-csv"
    }

    fn db_name(&self) -> &str {
        &self.cfg.db_name
    }

    fn init_thread(&self, thread_id: usize) -> Result<CsvThreadState> {
        let conn = match &self.connector {
            Some(connector) => Some(connector.connect()?),
            None => None,
        };
        let mut loaders = HashMap::new();
        for &table in &self.tables {
            if table == Table::Item && thread_id != 0 {
                continue;
            }
            loaders.insert(table, CsvBatchLoader::create(self.file_path(table, thread_id))?);
        }
        let seed = self.cfg.seed.map(|s| s.wrapping_add(thread_id as u64));
        Ok(CsvThreadState {
            thread_id,
            rng: RandomGenerator::new(self.constants, seed),
            conn,
            loaders,
        })
    }

    fn cleanup_thread(&self, mut state: CsvThreadState) -> Result<()> {
        if let Some(conn) = state.conn.as_mut() {
            conn.close_statements();
        }
        // Close every file even after a failure; report the first one
        let mut first_error = None;
        for (table, loader) in state.loaders.iter_mut() {
            if let Err(e) = loader.close() {
                warn!(
                    target: "tpcc::load",
                    thread = state.thread_id,
                    table = %table,
                    error = %e,
                    "Failed to close CSV file"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn prepare(&self, state: &mut CsvThreadState, cancel: &CancelToken) -> Result<()> {
        if let Some(ddl) = &self.ddl {
            if state.thread_id == 0 {
                let created = match state.conn.as_mut() {
                    Some(conn) => ddl.create_tables(conn.as_mut()),
                    None => Err(Error::ConnectionLost("no connection for schema creation".into())),
                };
                self.ddl_gate.open(created.is_ok());
                created?;
            } else {
                self.ddl_gate.wait(cancel)?;
            }
        }
        let thread_id = state.thread_id;
        prepare_workload(
            self,
            state,
            cancel,
            self.cfg.warehouses,
            self.cfg.threads,
            thread_id,
        )
    }

    fn check_prepare(&self, _state: &mut CsvThreadState, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }

    fn run(&self, _state: &mut CsvThreadState, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }

    fn check(&self, _state: &mut CsvThreadState, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self, _state: &mut CsvThreadState, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }

    fn output_stats(&self, _final_summary: bool) {}
}
