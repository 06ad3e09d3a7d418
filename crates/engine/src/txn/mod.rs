//! The five TPC-C transactions
//!
//! Each transaction module owns its input type (with a `generate` constructor
//! drawing TPC-C distributed inputs), its prepared statements and an
//! `execute` function running the protocol inside one `Transaction`.
//! Statements are prepared once per connection; NewOrder statements whose
//! shape depends on the number of order lines are prepared for every count
//! in 5..=15.

mod delivery;
mod new_order;
mod order_status;
mod payment;
mod stock_level;

pub use delivery::DeliveryInput;
pub use new_order::{NewOrderInput, NewOrderItem};
pub use order_status::OrderStatusInput;
pub use payment::PaymentInput;
pub use stock_level::StockLevelInput;

pub use new_order::UNUSED_ITEM_ID;
pub use payment::bad_credit_data;

pub(crate) use delivery::{execute as execute_delivery, DeliveryStatements};
pub(crate) use new_order::{execute as execute_new_order, NewOrderStatements};
pub(crate) use order_status::{execute as execute_order_status, OrderStatusStatements};
pub(crate) use payment::{execute as execute_payment, PaymentStatements};
pub(crate) use stock_level::{execute as execute_stock_level, StockLevelStatements};

use std::fmt;
use tpcc_core::schema::{MAX_ORDER_LINES, MIN_ORDER_LINES};
use tpcc_core::{Error, RandomGenerator, Result, SqlResultExt};
use tpcc_sql::{Connection, Dialect, Row, SqlValue, Statement, Transaction};

// ============================================================================
// Transaction kinds
// ============================================================================

/// One of the five transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxnKind {
    /// Enter an order
    NewOrder,
    /// Record a customer payment
    Payment,
    /// Query a customer's latest order
    OrderStatus,
    /// Deliver the oldest new order of every district
    Delivery,
    /// Count recently sold items below a stock threshold
    StockLevel,
}

impl TxnKind {
    /// All kinds, in weight order
    pub const ALL: [TxnKind; 5] = [
        TxnKind::NewOrder,
        TxnKind::Payment,
        TxnKind::OrderStatus,
        TxnKind::Delivery,
        TxnKind::StockLevel,
    ];

    /// Measurement name
    pub fn name(self) -> &'static str {
        match self {
            TxnKind::NewOrder => "new_order",
            TxnKind::Payment => "payment",
            TxnKind::OrderStatus => "order_status",
            TxnKind::Delivery => "delivery",
            TxnKind::StockLevel => "stock_level",
        }
    }

    /// Minimum keying time in seconds
    pub fn keying_time(self) -> f64 {
        match self {
            TxnKind::NewOrder => 18.0,
            TxnKind::Payment => 3.0,
            TxnKind::OrderStatus | TxnKind::Delivery | TxnKind::StockLevel => 2.0,
        }
    }

    /// Mean thinking time in seconds
    pub fn thinking_time(self) -> f64 {
        match self {
            TxnKind::NewOrder | TxnKind::Payment => 12.0,
            TxnKind::OrderStatus => 10.0,
            TxnKind::Delivery | TxnKind::StockLevel => 5.0,
        }
    }

    /// Whether the transaction only reads
    pub fn read_only(self) -> bool {
        matches!(self, TxnKind::OrderStatus | TxnKind::StockLevel)
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a transaction finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOutcome {
    /// Changes committed
    Committed,
    /// Rolled back on purpose (NewOrder with an unused item id)
    RolledBack,
}

/// How Payment and OrderStatus find their customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerSelector {
    /// By customer id
    ById(i64),
    /// By last name; the middle row ordered by first name is chosen
    ByLastName(String),
}

impl CustomerSelector {
    /// 60% by last name, 40% by id
    pub fn generate(rng: &mut RandomGenerator) -> Self {
        if rng.rand_int(1, 100) <= 60 {
            CustomerSelector::ByLastName(rng.rand_c_last())
        } else {
            CustomerSelector::ById(rng.rand_customer_id())
        }
    }
}

/// A warehouse other than `w_id` (only call with more than one warehouse)
pub(crate) fn other_warehouse(rng: &mut RandomGenerator, w_id: i64, warehouses: u32) -> i64 {
    loop {
        let candidate = rng.rand_int(1, i64::from(warehouses));
        if candidate != w_id {
            return candidate;
        }
    }
}

/// Round a money amount to cents
pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// ============================================================================
// Prepared statements
// ============================================================================

/// A statement handle together with its SQL text
#[derive(Debug)]
pub(crate) struct Prepared {
    handle: Statement,
    sql: String,
}

impl Prepared {
    pub(crate) fn new(conn: &mut dyn Connection, sql: String) -> Result<Self> {
        let handle = conn.prepare(&sql).with_query(&sql)?;
        Ok(Self { handle, sql })
    }
}

/// One statement per order-line count in 5..=15
#[derive(Debug)]
pub(crate) struct ItemCountVariants(Vec<Prepared>);

impl ItemCountVariants {
    pub(crate) fn new<F>(conn: &mut dyn Connection, build: F) -> Result<Self>
    where
        F: Fn(usize) -> String,
    {
        (MIN_ORDER_LINES..=MAX_ORDER_LINES)
            .map(|count| Prepared::new(conn, build(count)))
            .collect::<Result<Vec<_>>>()
            .map(ItemCountVariants)
    }

    pub(crate) fn get(&self, count: usize) -> Result<&Prepared> {
        count
            .checked_sub(MIN_ORDER_LINES)
            .and_then(|i| self.0.get(i))
            .ok_or_else(|| Error::not_found(format!("statement variant for {} order lines", count)))
    }
}

/// Every statement the transaction mix uses, prepared on one connection
#[derive(Debug)]
pub struct Statements {
    pub(crate) new_order: NewOrderStatements,
    pub(crate) payment: PaymentStatements,
    pub(crate) order_status: OrderStatusStatements,
    pub(crate) delivery: DeliveryStatements,
    pub(crate) stock_level: StockLevelStatements,
}

impl Statements {
    /// Prepare everything on `conn`
    pub fn prepare(conn: &mut dyn Connection, dialect: Dialect) -> Result<Self> {
        Ok(Self {
            new_order: NewOrderStatements::prepare(conn, dialect)?,
            payment: PaymentStatements::prepare(conn, dialect)?,
            order_status: OrderStatusStatements::prepare(conn)?,
            delivery: DeliveryStatements::prepare(conn, dialect)?,
            stock_level: StockLevelStatements::prepare(conn)?,
        })
    }

    /// Connection generation the statements were prepared on
    pub fn generation(&self) -> u64 {
        self.new_order.generation()
    }
}

// ============================================================================
// Execution helpers
// ============================================================================

pub(crate) fn exec(tx: &mut Transaction<'_>, stmt: &Prepared, params: &[SqlValue]) -> Result<u64> {
    tx.execute(&stmt.handle, params).with_query(&stmt.sql)
}

pub(crate) fn query(
    tx: &mut Transaction<'_>,
    stmt: &Prepared,
    params: &[SqlValue],
) -> Result<Vec<Row>> {
    tx.query(&stmt.handle, params).with_query(&stmt.sql)
}

pub(crate) fn query_one<F>(
    tx: &mut Transaction<'_>,
    stmt: &Prepared,
    params: &[SqlValue],
    what: F,
) -> Result<Row>
where
    F: FnOnce() -> String,
{
    query(tx, stmt, params)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(what()))
}

/// Row at position ceil(n/2) of a name-ordered customer list
pub(crate) fn pick_middle(rows: Vec<Row>, what: impl FnOnce() -> String) -> Result<Row> {
    let n = rows.len();
    if n == 0 {
        return Err(Error::not_found(what()));
    }
    rows.into_iter()
        .nth((n + 1) / 2 - 1)
        .ok_or_else(|| Error::not_found(String::from("customer")))
}
