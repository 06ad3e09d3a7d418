//! Payment: record a customer payment against a district and warehouse
//!
//! 85% of payments go to a customer of the home district; the rest to a
//! customer of a random district in another warehouse. Bad-credit customers
//! get a payment record prepended to `c_data`.

use super::{exec, other_warehouse, pick_middle, query, query_one, CustomerSelector, Prepared, TxnOutcome};
use tpcc_core::schema::MAX_C_DATA_LEN;
use tpcc_core::{RandomGenerator, Result};
use tpcc_sql::{Connection, Dialect, Transaction, TxOptions};

/// Payment input
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    /// Warehouse receiving the payment
    pub w_id: i64,
    /// District receiving the payment
    pub d_id: i64,
    /// Customer's warehouse
    pub c_w_id: i64,
    /// Customer's district
    pub c_d_id: i64,
    /// Customer lookup
    pub customer: CustomerSelector,
    /// Amount, 1.00..=5000.00
    pub amount: f64,
}

impl PaymentInput {
    /// Draw an input against `warehouses` warehouses
    pub fn generate(rng: &mut RandomGenerator, warehouses: u32) -> Self {
        let w_id = rng.rand_int(1, i64::from(warehouses));
        let d_id = rng.rand_int(1, 10);
        let amount = rng.rand_int(100, 500_000) as f64 / 100.0;
        let (c_w_id, c_d_id) = if warehouses == 1 || rng.rand_int(1, 100) <= 85 {
            (w_id, d_id)
        } else {
            (other_warehouse(rng, w_id, warehouses), rng.rand_int(1, 10))
        };
        Self {
            w_id,
            d_id,
            c_w_id,
            c_d_id,
            customer: CustomerSelector::generate(rng),
            amount,
        }
    }
}

/// Payment record prepended to a bad-credit customer's data
pub fn bad_credit_data(input: &PaymentInput, c_id: i64, c_data: &str) -> String {
    let mut data = format!(
        "| {:4} {:2} {:4} {:2} {:4} ${:7.2}",
        c_id, input.c_d_id, input.c_w_id, input.d_id, input.w_id, input.amount
    );
    data.push_str(c_data);
    if data.len() > MAX_C_DATA_LEN {
        let mut end = MAX_C_DATA_LEN;
        while !data.is_char_boundary(end) {
            end -= 1;
        }
        data.truncate(end);
    }
    data
}

// ============================================================================
// Statements
// ============================================================================

const UPDATE_DISTRICT: &str = "UPDATE district SET d_ytd = d_ytd + ? WHERE d_w_id = ? AND d_id = ?";
const SELECT_DISTRICT: &str = "SELECT d_street_1, d_street_2, d_city, d_state, d_zip, d_name \
    FROM district WHERE d_w_id = ? AND d_id = ?";
const UPDATE_WAREHOUSE: &str = "UPDATE warehouse SET w_ytd = w_ytd + ? WHERE w_id = ?";
const SELECT_WAREHOUSE: &str = "SELECT w_street_1, w_street_2, w_city, w_state, w_zip, w_name \
    FROM warehouse WHERE w_id = ?";
const SELECT_CUSTOMER_BY_LAST: &str = "SELECT c_id FROM customer \
    WHERE c_w_id = ? AND c_d_id = ? AND c_last = ? ORDER BY c_first";
const SELECT_CUSTOMER: &str = "SELECT c_first, c_middle, c_last, c_street_1, c_street_2, c_city, \
    c_state, c_zip, c_phone, c_credit, c_credit_lim, c_discount, c_balance, c_since \
    FROM customer WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";
const UPDATE_CUSTOMER: &str = "UPDATE customer SET c_balance = c_balance - ?, \
    c_ytd_payment = c_ytd_payment + ?, c_payment_cnt = c_payment_cnt + 1 \
    WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";
const SELECT_CUSTOMER_DATA: &str = "SELECT c_data FROM customer \
    WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";
const UPDATE_CUSTOMER_WITH_DATA: &str = "UPDATE customer SET c_balance = c_balance - ?, \
    c_ytd_payment = c_ytd_payment + ?, c_payment_cnt = c_payment_cnt + 1, c_data = ? \
    WHERE c_w_id = ? AND c_d_id = ? AND c_id = ?";
const INSERT_HISTORY: &str = "INSERT INTO history (h_c_d_id, h_c_w_id, h_c_id, h_d_id, h_w_id, \
    h_date, h_amount, h_data) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

/// Column of `c_credit` in the customer select
const CREDIT_COLUMN: usize = 9;

#[derive(Debug)]
pub(crate) struct PaymentStatements {
    update_district: Prepared,
    select_district: Prepared,
    update_warehouse: Prepared,
    select_warehouse: Prepared,
    select_customer_by_last: Prepared,
    select_customer: Prepared,
    update_customer: Prepared,
    select_customer_data: Prepared,
    update_customer_with_data: Prepared,
    insert_history: Prepared,
}

impl PaymentStatements {
    pub(crate) fn prepare(conn: &mut dyn Connection, dialect: Dialect) -> Result<Self> {
        Ok(Self {
            update_district: Prepared::new(conn, UPDATE_DISTRICT.to_string())?,
            select_district: Prepared::new(conn, SELECT_DISTRICT.to_string())?,
            update_warehouse: Prepared::new(conn, UPDATE_WAREHOUSE.to_string())?,
            select_warehouse: Prepared::new(conn, SELECT_WAREHOUSE.to_string())?,
            select_customer_by_last: Prepared::new(conn, SELECT_CUSTOMER_BY_LAST.to_string())?,
            select_customer: Prepared::new(conn, dialect.locking_read(SELECT_CUSTOMER))?,
            update_customer: Prepared::new(conn, UPDATE_CUSTOMER.to_string())?,
            select_customer_data: Prepared::new(conn, SELECT_CUSTOMER_DATA.to_string())?,
            update_customer_with_data: Prepared::new(conn, UPDATE_CUSTOMER_WITH_DATA.to_string())?,
            insert_history: Prepared::new(conn, INSERT_HISTORY.to_string())?,
        })
    }
}

// ============================================================================
// Execution
// ============================================================================

pub(crate) fn execute(
    conn: &mut dyn Connection,
    stmts: &PaymentStatements,
    opts: TxOptions,
    input: &PaymentInput,
    now: &str,
) -> Result<TxnOutcome> {
    let (w_id, d_id, c_w_id, c_d_id) = (input.w_id, input.d_id, input.c_w_id, input.c_d_id);
    let mut tx = Transaction::begin(conn, opts)?;

    exec(
        &mut tx,
        &stmts.update_district,
        &[input.amount.into(), w_id.into(), d_id.into()],
    )?;
    let district = query_one(
        &mut tx,
        &stmts.select_district,
        &[w_id.into(), d_id.into()],
        || format!("district ({}, {})", w_id, d_id),
    )?;
    let d_name = district.get_str(5)?.to_string();

    exec(
        &mut tx,
        &stmts.update_warehouse,
        &[input.amount.into(), w_id.into()],
    )?;
    let warehouse = query_one(&mut tx, &stmts.select_warehouse, &[w_id.into()], || {
        format!("warehouse {}", w_id)
    })?;
    let w_name = warehouse.get_str(5)?.to_string();

    let c_id = match &input.customer {
        CustomerSelector::ById(c_id) => *c_id,
        CustomerSelector::ByLastName(last) => {
            let rows = query(
                &mut tx,
                &stmts.select_customer_by_last,
                &[c_w_id.into(), c_d_id.into(), last.as_str().into()],
            )?;
            pick_middle(rows, || format!("customer ({}, {}) named {}", c_w_id, c_d_id, last))?
                .get_i64(0)?
        }
    };

    let customer = query_one(
        &mut tx,
        &stmts.select_customer,
        &[c_w_id.into(), c_d_id.into(), c_id.into()],
        || format!("customer ({}, {}, {})", c_w_id, c_d_id, c_id),
    )?;
    if customer.get_str(CREDIT_COLUMN)? == "BC" {
        let data_row = query_one(
            &mut tx,
            &stmts.select_customer_data,
            &[c_w_id.into(), c_d_id.into(), c_id.into()],
            || format!("customer data ({}, {}, {})", c_w_id, c_d_id, c_id),
        )?;
        let c_data = bad_credit_data(input, c_id, data_row.get_str(0)?);
        exec(
            &mut tx,
            &stmts.update_customer_with_data,
            &[
                input.amount.into(),
                input.amount.into(),
                c_data.into(),
                c_w_id.into(),
                c_d_id.into(),
                c_id.into(),
            ],
        )?;
    } else {
        exec(
            &mut tx,
            &stmts.update_customer,
            &[
                input.amount.into(),
                input.amount.into(),
                c_w_id.into(),
                c_d_id.into(),
                c_id.into(),
            ],
        )?;
    }

    let h_data = format!("{}    {}", w_name, d_name);
    exec(
        &mut tx,
        &stmts.insert_history,
        &[
            c_d_id.into(),
            c_w_id.into(),
            c_id.into(),
            d_id.into(),
            w_id.into(),
            now.into(),
            input.amount.into(),
            h_data.into(),
        ],
    )?;

    tx.commit()?;
    Ok(TxnOutcome::Committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpcc_core::NuRandConstants;

    fn rng(seed: u64) -> RandomGenerator {
        RandomGenerator::new(NuRandConstants::from_seed(Some(seed)), Some(seed))
    }

    fn input() -> PaymentInput {
        PaymentInput {
            w_id: 1,
            d_id: 2,
            c_w_id: 3,
            c_d_id: 4,
            customer: CustomerSelector::ById(17),
            amount: 12.5,
        }
    }

    #[test]
    fn test_bad_credit_record_layout() {
        let data = bad_credit_data(&input(), 17, "old");
        assert_eq!(data, "|   17  4    3  2    1 $  12.50old");
    }

    #[test]
    fn test_bad_credit_data_truncated() {
        let old = "x".repeat(MAX_C_DATA_LEN);
        let data = bad_credit_data(&input(), 17, &old);
        assert_eq!(data.len(), MAX_C_DATA_LEN);
        assert!(data.starts_with("|   17"));
    }

    #[test]
    fn test_generate_ranges() {
        let mut r = rng(21);
        let mut remote = 0;
        for _ in 0..10_000 {
            let p = PaymentInput::generate(&mut r, 5);
            assert!((1.0..=5000.0).contains(&p.amount));
            assert!((1..=10).contains(&p.c_d_id));
            if p.c_w_id != p.w_id {
                remote += 1;
            }
        }
        assert!((1_000..2_000).contains(&remote), "remote {}", remote);
    }

    #[test]
    fn test_single_warehouse_pays_home_district() {
        let mut r = rng(22);
        for _ in 0..1_000 {
            let p = PaymentInput::generate(&mut r, 1);
            assert_eq!((p.c_w_id, p.c_d_id), (p.w_id, p.d_id));
        }
    }
}
