//! The SQL workloader
//!
//! `Workloader` owns the configuration, the connector, the schema manager
//! and both measurements. Worker state lives in `ThreadState` and is passed
//! explicitly to every lifecycle call.
//!
//! # Example
//!
//! ```ignore
//! let connector = Arc::new(SqliteConnector::open("tpcc.db"));
//! let workloader = Arc::new(Workloader::new(connector, Config::default())?);
//! let runner = Runner::new(RunnerConfig::default());
//! runner.execute(&workloader, Action::Prepare)?;
//! runner.execute(&workloader, Action::Run)?;
//! ```

use crate::check::{check_warehouses, conditions};
use crate::ddl::DdlManager;
use crate::deck::Deck;
use crate::load::prepare_workload;
use crate::state::ThreadState;
use crate::txn::{
    execute_delivery, execute_new_order, execute_order_status, execute_payment,
    execute_stock_level, DeliveryInput, NewOrderInput, OrderStatusInput, PaymentInput,
    StockLevelInput, TxnKind, TxnOutcome,
};
use crate::workload::Workload;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tpcc_core::schema::now_timestamp;
use tpcc_core::{CancelToken, Config, Error, NuRandConstants, RandomGenerator, Result};
use tpcc_measurement::{Measurement, Reporter, StdoutReporter};
use tpcc_sql::{Connector, Dialect, TxOptions};
use tracing::{debug, info};

/// tpmC ceiling of one warehouse under the TPC-C wait times
pub const MAX_TPMC_PER_WAREHOUSE: f64 = 12.86;

/// Histogram clamp for keying and thinking times
const MAX_WAIT_TIME: Duration = Duration::from_secs(300);

/// One-shot signal from worker 0 that table creation finished
#[derive(Default)]
pub(crate) struct DdlGate {
    created: Mutex<Option<bool>>,
    ready: Condvar,
}

impl DdlGate {
    pub(crate) fn open(&self, created: bool) {
        *self.created.lock() = Some(created);
        self.ready.notify_all();
    }

    pub(crate) fn wait(&self, cancel: &CancelToken) -> Result<()> {
        let mut created = self.created.lock();
        loop {
            match *created {
                Some(true) => return Ok(()),
                Some(false) => return Err(Error::Cancelled),
                None if cancel.is_cancelled() => return Err(Error::Cancelled),
                None => {
                    self.ready.wait_for(&mut created, Duration::from_millis(100));
                }
            }
        }
    }
}

/// TPC-C workload against a SQL database
pub struct Workloader {
    pub(crate) cfg: Config,
    connector: Arc<dyn Connector>,
    dialect: Dialect,
    ddl: DdlManager,
    weights: [u32; 5],
    constants: NuRandConstants,
    pub(crate) init_load_time: String,
    rt_measurement: Measurement,
    wait_measurement: Measurement,
    reporter: Arc<dyn Reporter>,
    ddl_gate: DdlGate,
}

impl Workloader {
    /// Validate `cfg` and build a workloader on `connector`
    pub fn new(connector: Arc<dyn Connector>, cfg: Config) -> Result<Self> {
        cfg.validate()?;
        let weights = cfg.weights()?;
        let dialect = connector.dialect();
        let ddl = DdlManager::new(
            cfg.parts,
            cfg.use_fk,
            cfg.warehouses,
            cfg.partition_type,
            dialect,
        );
        let rt_measurement = measurement(cfg.max_measure_latency())?;
        let wait_measurement = measurement(MAX_WAIT_TIME)?;
        Ok(Self {
            constants: NuRandConstants::from_seed(cfg.seed),
            init_load_time: now_timestamp(),
            wait_measurement,
            reporter: Arc::new(StdoutReporter),
            ddl_gate: DdlGate::default(),
            connector,
            dialect,
            ddl,
            weights,
            rt_measurement,
            cfg,
        })
    }

    /// Send reports to `reporter` instead of stdout
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The validated configuration
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// SQL dialect of the connector
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Schema manager
    pub fn ddl(&self) -> &DdlManager {
        &self.ddl
    }

    /// Transaction latencies
    pub fn rt_measurement(&self) -> &Measurement {
        &self.rt_measurement
    }

    /// Keying and thinking times
    pub fn wait_measurement(&self) -> &Measurement {
        &self.wait_measurement
    }

    fn tx_options(&self, kind: TxnKind) -> TxOptions {
        if kind.read_only() {
            TxOptions::read_only(self.cfg.isolation)
        } else {
            TxOptions::read_write(self.cfg.isolation)
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run one NewOrder with the given input
    pub fn execute_new_order(
        &self,
        state: &mut ThreadState,
        input: &NewOrderInput,
    ) -> Result<TxnOutcome> {
        state.ensure_statements(self.dialect)?;
        let opts = self.tx_options(TxnKind::NewOrder);
        let (conn, stmts) = state.split()?;
        execute_new_order(conn, &stmts.new_order, opts, input, &now_timestamp())
    }

    /// Run one Payment with the given input
    pub fn execute_payment(&self, state: &mut ThreadState, input: &PaymentInput) -> Result<TxnOutcome> {
        state.ensure_statements(self.dialect)?;
        let opts = self.tx_options(TxnKind::Payment);
        let (conn, stmts) = state.split()?;
        execute_payment(conn, &stmts.payment, opts, input, &now_timestamp())
    }

    /// Run one OrderStatus with the given input
    pub fn execute_order_status(
        &self,
        state: &mut ThreadState,
        input: &OrderStatusInput,
    ) -> Result<TxnOutcome> {
        state.ensure_statements(self.dialect)?;
        let opts = self.tx_options(TxnKind::OrderStatus);
        let (conn, stmts) = state.split()?;
        execute_order_status(conn, &stmts.order_status, opts, input)
    }

    /// Run one Delivery with the given input
    pub fn execute_delivery(&self, state: &mut ThreadState, input: &DeliveryInput) -> Result<TxnOutcome> {
        state.ensure_statements(self.dialect)?;
        let opts = self.tx_options(TxnKind::Delivery);
        let (conn, stmts) = state.split()?;
        execute_delivery(conn, &stmts.delivery, opts, input, &now_timestamp())
    }

    /// Run one StockLevel with the given input
    pub fn execute_stock_level(
        &self,
        state: &mut ThreadState,
        input: &StockLevelInput,
    ) -> Result<TxnOutcome> {
        state.ensure_statements(self.dialect)?;
        let opts = self.tx_options(TxnKind::StockLevel);
        let (conn, stmts) = state.split()?;
        execute_stock_level(conn, &stmts.stock_level, opts, input)
    }

    /// Draw an input for `kind` from the worker's RNG and run it
    pub fn execute_kind(&self, state: &mut ThreadState, kind: TxnKind) -> Result<TxnOutcome> {
        let warehouses = self.cfg.warehouses;
        match kind {
            TxnKind::NewOrder => {
                let input = NewOrderInput::generate(&mut state.rng, warehouses);
                self.execute_new_order(state, &input)
            }
            TxnKind::Payment => {
                let input = PaymentInput::generate(&mut state.rng, warehouses);
                self.execute_payment(state, &input)
            }
            TxnKind::OrderStatus => {
                let input = OrderStatusInput::generate(&mut state.rng, warehouses);
                self.execute_order_status(state, &input)
            }
            TxnKind::Delivery => {
                let input = DeliveryInput::generate(&mut state.rng, warehouses);
                self.execute_delivery(state, &input)
            }
            TxnKind::StockLevel => {
                let input = StockLevelInput::generate(&mut state.rng, warehouses);
                self.execute_stock_level(state, &input)
            }
        }
    }

    /// Sleep `secs` unless cancelled, recording the time actually waited;
    /// returns false when cancelled
    fn pause(&self, name: String, secs: f64, cancel: &CancelToken) -> bool {
        let start = Instant::now();
        let completed = cancel.sleep(Duration::from_secs_f64(secs));
        self.wait_measurement.measure(&name, start.elapsed(), false);
        completed
    }

    fn check_with(&self, state: &mut ThreadState, cancel: &CancelToken, all: bool) -> Result<()> {
        state.ensure_live(self.connector.as_ref())?;
        let conditions = conditions(self.dialect, all);
        check_warehouses(
            state.conn.as_mut(),
            &conditions,
            state.thread_id,
            self.cfg.threads,
            self.cfg.warehouses,
            cancel,
        )
    }
}

fn measurement(max_latency: Duration) -> Result<Measurement> {
    Measurement::new(max_latency).map_err(|e| {
        Error::InvalidConfig(format!("latency bound {:?}: {}", max_latency, e))
    })
}

/// Think time `-ln(r) * mean` with `r` uniform in (0, 1], capped at 10x mean
pub fn think_time(rng: &mut RandomGenerator, mean: f64) -> f64 {
    let r = 1.0 - rng.float();
    (-r.ln() * mean).min(mean * 10.0)
}

impl Workload for Workloader {
    type State = ThreadState;

    fn name(&self) -> &str {
        "tpcc"
    }

    fn db_name(&self) -> &str {
        &self.cfg.db_name
    }

    fn init_thread(&self, thread_id: usize) -> Result<ThreadState> {
        let conn = self.connector.connect()?;
        let seed = self.cfg.seed.map(|s| s.wrapping_add(thread_id as u64));
        let rng = RandomGenerator::new(self.constants, seed);
        let deck = Deck::new(self.weights)?;
        debug!(target: "tpcc::runner", thread = thread_id, "Worker initialized");
        Ok(ThreadState::new(thread_id, rng, conn, deck))
    }

    fn cleanup_thread(&self, mut state: ThreadState) -> Result<()> {
        state.close();
        Ok(())
    }

    fn prepare(&self, state: &mut ThreadState, cancel: &CancelToken) -> Result<()> {
        if state.thread_id == 0 {
            let created = self.ddl.create_tables(state.conn.as_mut());
            self.ddl_gate.open(created.is_ok());
            created?;
        } else {
            self.ddl_gate.wait(cancel)?;
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

    fn check_prepare(&self, state: &mut ThreadState, cancel: &CancelToken) -> Result<()> {
        if self.cfg.no_check {
            debug!(target: "tpcc::check", thread = state.thread_id, "Skipping checks after load");
            return Ok(());
        }
        self.check_with(state, cancel, true)
    }

    fn run(&self, state: &mut ThreadState, cancel: &CancelToken) -> Result<()> {
        state.ensure_live(self.connector.as_ref())?;
        state.ensure_statements(self.dialect)?;

        let kind = state.deck.draw(&mut state.rng);
        if self.cfg.wait && !self.pause(format!("keyingTime-{}", kind), kind.keying_time(), cancel) {
            return Ok(());
        }

        let start = Instant::now();
        let result = self.execute_kind(state, kind);
        self.rt_measurement
            .measure(kind.name(), start.elapsed(), result.is_err());

        if self.cfg.wait {
            let secs = think_time(&mut state.rng, kind.thinking_time());
            self.pause(format!("thinkingTime-{}", kind), secs, cancel);
        }
        result.map(|_| ())
    }

    fn check(&self, state: &mut ThreadState, cancel: &CancelToken) -> Result<()> {
        self.check_with(state, cancel, self.cfg.check_all)
    }

    fn cleanup(&self, state: &mut ThreadState, _cancel: &CancelToken) -> Result<()> {
        if state.thread_id == 0 {
            state.ensure_live(self.connector.as_ref())?;
            self.ddl.drop_tables(state.conn.as_mut())?;
            info!(target: "tpcc::ddl", db = %self.cfg.db_name, "Dropped all tables");
        }
        Ok(())
    }

    fn output_stats(&self, final_summary: bool) {
        let reporter = self.reporter.as_ref();
        self.rt_measurement.output(final_summary, |prefix, histograms| {
            for (op, histogram) in histograms {
                if !histogram.is_empty() {
                    reporter.report_latency(prefix, &op.to_uppercase(), &histogram.info());
                }
            }
        });
        if self.cfg.wait {
            self.wait_measurement.output(final_summary, |prefix, histograms| {
                for (op, histogram) in histograms {
                    if !histogram.is_empty() {
                        let avg_secs = histogram.info().avg_ms / 1000.0;
                        reporter.report_wait_time(prefix, &op.to_uppercase(), avg_secs);
                    }
                }
            });
        }
        if final_summary {
            if let Some(info) = self.rt_measurement.summary_info(TxnKind::NewOrder.name()) {
                if info.count > 0 {
                    let tpmc = info.ops * 60.0;
                    let efficiency =
                        100.0 * tpmc / (MAX_TPMC_PER_WAREHOUSE * f64::from(self.cfg.warehouses));
                    reporter.report_tpmc(tpmc, efficiency);
                }
            }
        }
    }
}
