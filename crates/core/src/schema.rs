//! Table names, cardinalities and timestamp formatting

use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

/// Rows in `item` (not scaled by warehouses)
pub const MAX_ITEMS: i64 = 100_000;
/// Rows in `stock` per warehouse
pub const STOCK_PER_WAREHOUSE: i64 = 100_000;
/// Districts per warehouse
pub const DISTRICTS_PER_WAREHOUSE: i64 = 10;
/// Customers per district
pub const CUSTOMERS_PER_DISTRICT: i64 = 3_000;
/// Orders loaded per district
pub const ORDERS_PER_DISTRICT: i64 = 3_000;
/// First order id that is still undelivered after loading
pub const FIRST_UNDELIVERED_ORDER: i64 = 2_101;
/// Undelivered (new) orders loaded per district
pub const NEW_ORDERS_PER_DISTRICT: i64 = ORDERS_PER_DISTRICT - FIRST_UNDELIVERED_ORDER + 1;
/// Fewest lines in an order
pub const MIN_ORDER_LINES: usize = 5;
/// Most lines in an order
pub const MAX_ORDER_LINES: usize = 15;
/// Longest `c_data` kept after a bad-credit payment
pub const MAX_C_DATA_LEN: usize = 500;

/// Timestamp layout used for every DATETIME column and CSV field
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp for DATETIME columns
pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// Current local time formatted for DATETIME columns
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now())
}

/// The nine TPC-C tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// item
    Item,
    /// warehouse
    Warehouse,
    /// district
    District,
    /// customer
    Customer,
    /// history
    History,
    /// new_order
    NewOrder,
    /// orders
    Orders,
    /// order_line
    OrderLine,
    /// stock
    Stock,
}

impl Table {
    /// Every table, in load order
    pub const ALL: [Table; 9] = [
        Table::Item,
        Table::Warehouse,
        Table::District,
        Table::Customer,
        Table::History,
        Table::NewOrder,
        Table::Orders,
        Table::OrderLine,
        Table::Stock,
    ];

    /// SQL table name
    pub fn name(self) -> &'static str {
        match self {
            Table::Item => "item",
            Table::Warehouse => "warehouse",
            Table::District => "district",
            Table::Customer => "customer",
            Table::History => "history",
            Table::NewOrder => "new_order",
            Table::Orders => "orders",
            Table::OrderLine => "order_line",
            Table::Stock => "stock",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown table '{}'", s))
    }
}
