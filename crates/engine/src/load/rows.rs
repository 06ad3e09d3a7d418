//! Initial-population row generators
//!
//! Shared by the SQL and CSV loaders so both produce identical rows. Column
//! order matches the CREATE TABLE definitions.

use tpcc_core::schema::{FIRST_UNDELIVERED_ORDER, MAX_ITEMS};
use tpcc_core::RandomGenerator;
use tpcc_sql::SqlValue;

/// `INSERT ... VALUES ` prefixes, one per table
pub mod insert {
    /// item
    pub const ITEM: &str = "INSERT INTO item (i_id, i_im_id, i_name, i_price, i_data) VALUES ";
    /// warehouse
    pub const WAREHOUSE: &str = "INSERT INTO warehouse (w_id, w_name, w_street_1, w_street_2, \
        w_city, w_state, w_zip, w_tax, w_ytd) VALUES ";
    /// stock
    pub const STOCK: &str = "INSERT INTO stock (s_i_id, s_w_id, s_quantity, s_dist_01, \
        s_dist_02, s_dist_03, s_dist_04, s_dist_05, s_dist_06, s_dist_07, s_dist_08, s_dist_09, \
        s_dist_10, s_ytd, s_order_cnt, s_remote_cnt, s_data) VALUES ";
    /// district
    pub const DISTRICT: &str = "INSERT INTO district (d_id, d_w_id, d_name, d_street_1, \
        d_street_2, d_city, d_state, d_zip, d_tax, d_ytd, d_next_o_id) VALUES ";
    /// customer
    pub const CUSTOMER: &str = "INSERT INTO customer (c_id, c_d_id, c_w_id, c_first, c_middle, \
        c_last, c_street_1, c_street_2, c_city, c_state, c_zip, c_phone, c_since, c_credit, \
        c_credit_lim, c_discount, c_balance, c_ytd_payment, c_payment_cnt, c_delivery_cnt, \
        c_data) VALUES ";
    /// history
    pub const HISTORY: &str = "INSERT INTO history (h_c_id, h_c_d_id, h_c_w_id, h_d_id, h_w_id, \
        h_date, h_amount, h_data) VALUES ";
    /// orders
    pub const ORDERS: &str = "INSERT INTO orders (o_id, o_d_id, o_w_id, o_c_id, o_entry_d, \
        o_carrier_id, o_ol_cnt, o_all_local) VALUES ";
    /// new_order
    pub const NEW_ORDER: &str = "INSERT INTO new_order (no_o_id, no_d_id, no_w_id) VALUES ";
    /// order_line
    pub const ORDER_LINE: &str = "INSERT INTO order_line (ol_o_id, ol_d_id, ol_w_id, ol_number, \
        ol_i_id, ol_supply_w_id, ol_delivery_d, ol_quantity, ol_amount, ol_dist_info) VALUES ";
}

fn text(s: impl Into<String>) -> SqlValue {
    SqlValue::Text(s.into())
}

/// One `item` row
pub fn item(rng: &mut RandomGenerator, i_id: i64) -> Vec<SqlValue> {
    let i_im_id = rng.rand_int(1, 10_000);
    let i_price = rng.rand_int(100, 10_000) as f64 / 100.0;
    let i_name = rng.rand_chars(14, 24);
    let i_data = rng.rand_original_string();
    vec![
        i_id.into(),
        i_im_id.into(),
        text(i_name),
        i_price.into(),
        text(i_data),
    ]
}

/// The `warehouse` row
pub fn warehouse(rng: &mut RandomGenerator, w_id: i64) -> Vec<SqlValue> {
    vec![
        w_id.into(),
        text(rng.rand_chars(6, 10)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_state()),
        text(rng.rand_zip()),
        rng.rand_tax().into(),
        SqlValue::Float(300_000.0),
    ]
}

/// One `stock` row
pub fn stock(rng: &mut RandomGenerator, w_id: i64, i_id: i64) -> Vec<SqlValue> {
    let mut row: Vec<SqlValue> = Vec::with_capacity(17);
    row.push(i_id.into());
    row.push(w_id.into());
    row.push(rng.rand_int(10, 100).into());
    for _ in 0..10 {
        row.push(text(rng.rand_letters(24, 24)));
    }
    row.push(0i64.into());
    row.push(0i64.into());
    row.push(0i64.into());
    row.push(text(rng.rand_original_string()));
    row
}

/// One `district` row
pub fn district(rng: &mut RandomGenerator, w_id: i64, d_id: i64) -> Vec<SqlValue> {
    vec![
        d_id.into(),
        w_id.into(),
        text(rng.rand_chars(6, 10)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_chars(10, 20)),
        text(rng.rand_state()),
        text(rng.rand_zip()),
        rng.rand_tax().into(),
        SqlValue::Float(30_000.0),
        (tpcc_core::schema::ORDERS_PER_DISTRICT + 1).into(),
    ]
}

/// One `customer` row; the first 1000 customers of a district get sequential
/// last names, the rest NURand-drawn ones
pub fn customer(
    rng: &mut RandomGenerator,
    w_id: i64,
    d_id: i64,
    c_id: i64,
    load_time: &str,
) -> Vec<SqlValue> {
    let c_last = if c_id <= 1000 {
        tpcc_core::rand_c_last_syllables(c_id - 1)
    } else {
        rng.rand_c_last_load()
    };
    let c_first = rng.rand_chars(8, 16);
    let c_street_1 = rng.rand_chars(10, 20);
    let c_street_2 = rng.rand_chars(10, 20);
    let c_city = rng.rand_chars(10, 20);
    let c_state = rng.rand_state();
    let c_zip = rng.rand_zip();
    let c_phone = rng.rand_numbers(16, 16);
    let c_credit = if rng.rand_int(1, 10) == 1 { "BC" } else { "GC" };
    let c_discount = rng.rand_int(0, 5000) as f64 / 10_000.0;
    let c_data = rng.rand_chars(300, 500);
    vec![
        c_id.into(),
        d_id.into(),
        w_id.into(),
        text(c_first),
        text("OE"),
        text(c_last),
        text(c_street_1),
        text(c_street_2),
        text(c_city),
        text(c_state),
        text(c_zip),
        text(c_phone),
        text(load_time),
        text(c_credit),
        SqlValue::Float(50_000.0),
        c_discount.into(),
        SqlValue::Float(-10.0),
        SqlValue::Float(10.0),
        1i64.into(),
        0i64.into(),
        text(c_data),
    ]
}

/// The `history` row of one customer
pub fn history(
    rng: &mut RandomGenerator,
    w_id: i64,
    d_id: i64,
    c_id: i64,
    load_time: &str,
) -> Vec<SqlValue> {
    vec![
        c_id.into(),
        d_id.into(),
        w_id.into(),
        d_id.into(),
        w_id.into(),
        text(load_time),
        SqlValue::Float(10.0),
        text(rng.rand_chars(12, 24)),
    ]
}

/// Customer ids for the orders of one district, in order-id order
pub fn order_customer_ids(rng: &mut RandomGenerator, orders: usize) -> Vec<i64> {
    let mut cids = rng.perm(orders);
    rng.shuffle(&mut cids);
    cids.into_iter().map(|c| c as i64 + 1).collect()
}

/// One `orders` row and its line count
pub fn order(
    rng: &mut RandomGenerator,
    w_id: i64,
    d_id: i64,
    o_id: i64,
    c_id: i64,
    load_time: &str,
) -> (Vec<SqlValue>, i64) {
    let carrier = if o_id < FIRST_UNDELIVERED_ORDER {
        SqlValue::Int(rng.rand_int(1, 10))
    } else {
        SqlValue::Null
    };
    let ol_cnt = rng.rand_int(5, 15);
    let row = vec![
        o_id.into(),
        d_id.into(),
        w_id.into(),
        c_id.into(),
        text(load_time),
        carrier,
        ol_cnt.into(),
        1i64.into(),
    ];
    (row, ol_cnt)
}

/// One `new_order` row
pub fn new_order(w_id: i64, d_id: i64, o_id: i64) -> Vec<SqlValue> {
    vec![o_id.into(), d_id.into(), w_id.into()]
}

/// One `order_line` row; lines of delivered orders carry the load time and a
/// zero amount
pub fn order_line(
    rng: &mut RandomGenerator,
    w_id: i64,
    d_id: i64,
    o_id: i64,
    number: i64,
    load_time: &str,
) -> Vec<SqlValue> {
    let ol_i_id = rng.rand_int(1, MAX_ITEMS);
    let (delivery_d, amount) = if o_id < FIRST_UNDELIVERED_ORDER {
        (text(load_time), 0.0)
    } else {
        (SqlValue::Null, rng.rand_int(1, 999_999) as f64 / 100.0)
    };
    vec![
        o_id.into(),
        d_id.into(),
        w_id.into(),
        number.into(),
        ol_i_id.into(),
        w_id.into(),
        delivery_d,
        5i64.into(),
        amount.into(),
        text(rng.rand_chars(24, 24)),
    ]
}
