//! Schema creation and teardown
//!
//! The nine tables are described once as `TableDef` values and rendered per
//! dialect. On MySQL-compatible engines secondary indexes are declared inline
//! and, when `parts > 1`, every table except `item` gets a partition clause on
//! its warehouse column. SQLite gets separate CREATE INDEX statements and no
//! partitioning.

use std::fmt::Write;
use tpcc_core::{PartitionType, Result, SqlResultExt, Table};
use tpcc_sql::{Connection, Dialect};
use tracing::{info, warn};

/// Static description of one table
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    /// Which table
    pub table: Table,
    /// Column definitions, in row order
    pub columns: &'static [&'static str],
    /// Primary key columns, if any
    pub primary_key: Option<&'static str>,
    /// Secondary indexes as `(name, columns)`
    pub indexes: &'static [(&'static str, &'static str)],
    /// Column partitioned on when partitioning is enabled
    pub partition_key: Option<&'static str>,
}

/// Tables in creation order
pub const TABLE_DEFS: [TableDef; 9] = [
    TableDef {
        table: Table::Warehouse,
        columns: &[
            "w_id INT NOT NULL",
            "w_name VARCHAR(10)",
            "w_street_1 VARCHAR(20)",
            "w_street_2 VARCHAR(20)",
            "w_city VARCHAR(20)",
            "w_state CHAR(2)",
            "w_zip CHAR(9)",
            "w_tax DECIMAL(4, 4)",
            "w_ytd DECIMAL(12, 2)",
        ],
        primary_key: Some("w_id"),
        indexes: &[],
        partition_key: Some("w_id"),
    },
    TableDef {
        table: Table::District,
        columns: &[
            "d_id INT NOT NULL",
            "d_w_id INT NOT NULL",
            "d_name VARCHAR(10)",
            "d_street_1 VARCHAR(20)",
            "d_street_2 VARCHAR(20)",
            "d_city VARCHAR(20)",
            "d_state CHAR(2)",
            "d_zip CHAR(9)",
            "d_tax DECIMAL(4, 4)",
            "d_ytd DECIMAL(12, 2)",
            "d_next_o_id INT",
        ],
        primary_key: Some("d_w_id, d_id"),
        indexes: &[],
        partition_key: Some("d_w_id"),
    },
    TableDef {
        table: Table::Customer,
        columns: &[
            "c_id INT NOT NULL",
            "c_d_id INT NOT NULL",
            "c_w_id INT NOT NULL",
            "c_first VARCHAR(16)",
            "c_middle CHAR(2)",
            "c_last VARCHAR(16)",
            "c_street_1 VARCHAR(20)",
            "c_street_2 VARCHAR(20)",
            "c_city VARCHAR(20)",
            "c_state CHAR(2)",
            "c_zip CHAR(9)",
            "c_phone CHAR(16)",
            "c_since DATETIME",
            "c_credit CHAR(2)",
            "c_credit_lim DECIMAL(12, 2)",
            "c_discount DECIMAL(4, 4)",
            "c_balance DECIMAL(12, 2)",
            "c_ytd_payment DECIMAL(12, 2)",
            "c_payment_cnt INT",
            "c_delivery_cnt INT",
            "c_data VARCHAR(500)",
        ],
        primary_key: Some("c_w_id, c_d_id, c_id"),
        indexes: &[("idx_customer", "c_w_id, c_d_id, c_last, c_first")],
        partition_key: Some("c_w_id"),
    },
    TableDef {
        table: Table::History,
        columns: &[
            "h_c_id INT NOT NULL",
            "h_c_d_id INT NOT NULL",
            "h_c_w_id INT NOT NULL",
            "h_d_id INT NOT NULL",
            "h_w_id INT NOT NULL",
            "h_date DATETIME",
            "h_amount DECIMAL(6, 2)",
            "h_data VARCHAR(24)",
        ],
        primary_key: None,
        indexes: &[
            ("idx_h_w_id", "h_w_id"),
            ("idx_h_c_w_id", "h_c_w_id, h_c_d_id, h_c_id"),
        ],
        partition_key: Some("h_w_id"),
    },
    TableDef {
        table: Table::NewOrder,
        columns: &[
            "no_o_id INT NOT NULL",
            "no_d_id INT NOT NULL",
            "no_w_id INT NOT NULL",
        ],
        primary_key: Some("no_w_id, no_d_id, no_o_id"),
        indexes: &[],
        partition_key: Some("no_w_id"),
    },
    TableDef {
        table: Table::Orders,
        columns: &[
            "o_id INT NOT NULL",
            "o_d_id INT NOT NULL",
            "o_w_id INT NOT NULL",
            "o_c_id INT",
            "o_entry_d DATETIME",
            "o_carrier_id INT",
            "o_ol_cnt INT",
            "o_all_local INT",
        ],
        primary_key: Some("o_w_id, o_d_id, o_id"),
        indexes: &[("idx_order", "o_w_id, o_d_id, o_c_id, o_id")],
        partition_key: Some("o_w_id"),
    },
    TableDef {
        table: Table::OrderLine,
        columns: &[
            "ol_o_id INT NOT NULL",
            "ol_d_id INT NOT NULL",
            "ol_w_id INT NOT NULL",
            "ol_number INT NOT NULL",
            "ol_i_id INT NOT NULL",
            "ol_supply_w_id INT",
            "ol_delivery_d DATETIME",
            "ol_quantity INT",
            "ol_amount DECIMAL(6, 2)",
            "ol_dist_info CHAR(24)",
        ],
        primary_key: Some("ol_w_id, ol_d_id, ol_o_id, ol_number"),
        indexes: &[],
        partition_key: Some("ol_w_id"),
    },
    TableDef {
        table: Table::Stock,
        columns: &[
            "s_i_id INT NOT NULL",
            "s_w_id INT NOT NULL",
            "s_quantity INT",
            "s_dist_01 CHAR(24)",
            "s_dist_02 CHAR(24)",
            "s_dist_03 CHAR(24)",
            "s_dist_04 CHAR(24)",
            "s_dist_05 CHAR(24)",
            "s_dist_06 CHAR(24)",
            "s_dist_07 CHAR(24)",
            "s_dist_08 CHAR(24)",
            "s_dist_09 CHAR(24)",
            "s_dist_10 CHAR(24)",
            "s_ytd INT",
            "s_order_cnt INT",
            "s_remote_cnt INT",
            "s_data VARCHAR(50)",
        ],
        primary_key: Some("s_w_id, s_i_id"),
        indexes: &[],
        partition_key: Some("s_w_id"),
    },
    TableDef {
        table: Table::Item,
        columns: &[
            "i_id INT NOT NULL",
            "i_im_id INT",
            "i_name VARCHAR(24)",
            "i_price DECIMAL(5, 2)",
            "i_data VARCHAR(50)",
        ],
        primary_key: Some("i_id"),
        indexes: &[],
        partition_key: None,
    },
];

/// Foreign keys added after creation when requested
const FOREIGN_KEYS: [(&str, &str, &str, &str, &str); 10] = [
    ("district", "fk_district_warehouse", "d_w_id", "warehouse", "w_id"),
    ("customer", "fk_customer_district", "c_w_id, c_d_id", "district", "d_w_id, d_id"),
    (
        "history",
        "fk_history_customer",
        "h_c_w_id, h_c_d_id, h_c_id",
        "customer",
        "c_w_id, c_d_id, c_id",
    ),
    ("history", "fk_history_district", "h_w_id, h_d_id", "district", "d_w_id, d_id"),
    (
        "new_order",
        "fk_new_order_orders",
        "no_w_id, no_d_id, no_o_id",
        "orders",
        "o_w_id, o_d_id, o_id",
    ),
    (
        "orders",
        "fk_orders_customer",
        "o_w_id, o_d_id, o_c_id",
        "customer",
        "c_w_id, c_d_id, c_id",
    ),
    (
        "order_line",
        "fk_order_line_orders",
        "ol_w_id, ol_d_id, ol_o_id",
        "orders",
        "o_w_id, o_d_id, o_id",
    ),
    (
        "order_line",
        "fk_order_line_stock",
        "ol_supply_w_id, ol_i_id",
        "stock",
        "s_w_id, s_i_id",
    ),
    ("stock", "fk_stock_warehouse", "s_w_id", "warehouse", "w_id"),
    ("stock", "fk_stock_item", "s_i_id", "item", "i_id"),
];

/// Builds and drops the TPC-C schema
#[derive(Debug, Clone)]
pub struct DdlManager {
    parts: u32,
    use_fk: bool,
    warehouses: u32,
    partition_type: PartitionType,
    dialect: Dialect,
}

impl DdlManager {
    /// Schema manager for the given partitioning and dialect
    pub fn new(
        parts: u32,
        use_fk: bool,
        warehouses: u32,
        partition_type: PartitionType,
        dialect: Dialect,
    ) -> Self {
        Self {
            parts,
            use_fk,
            warehouses,
            partition_type,
            dialect,
        }
    }

    fn warehouses_per_partition(&self) -> u32 {
        (self.warehouses + self.parts - 1) / self.parts
    }

    /// Append the configured partition clause on `key` to `query`
    pub fn append_partition(&self, query: &str, key: &str) -> String {
        if self.parts <= 1 || !self.dialect.supports_partitioning() {
            return query.to_string();
        }
        let mut out = String::from(query);
        match self.partition_type {
            PartitionType::Hash => {
                let _ = write!(out, "\nPARTITION BY HASH({})\nPARTITIONS {}", key, self.parts);
            }
            PartitionType::Range => {
                let wpp = self.warehouses_per_partition();
                let _ = write!(out, "\nPARTITION BY RANGE ({})\n(", key);
                for i in 0..self.parts {
                    if i > 0 {
                        out.push_str(",\n ");
                    }
                    let _ = write!(out, "PARTITION p{} VALUES LESS THAN ({})", i, 1 + (i + 1) * wpp);
                }
                out.push(')');
            }
            PartitionType::ListAsHash => {
                let groups = (0..self.parts)
                    .map(|i| {
                        (0..self.warehouses)
                            .filter(|j| j % self.parts == i)
                            .map(|j| j + 1)
                            .collect()
                    })
                    .collect();
                self.write_list(&mut out, key, groups);
            }
            PartitionType::ListAsRange => {
                let wpp = self.warehouses_per_partition();
                let groups = (0..self.parts)
                    .map(|i| {
                        let first = i * wpp + 1;
                        let last = ((i + 1) * wpp).min(self.warehouses);
                        (first..=last).collect()
                    })
                    .collect();
                self.write_list(&mut out, key, groups);
            }
        }
        out
    }

    // Empty groups are skipped: `VALUES IN ()` is not valid SQL
    fn write_list(&self, out: &mut String, key: &str, groups: Vec<Vec<u32>>) {
        let _ = write!(out, "\nPARTITION BY LIST ({})\n(", key);
        let mut first = true;
        for (i, ids) in groups.iter().enumerate() {
            if ids.is_empty() {
                continue;
            }
            if !first {
                out.push_str(",\n ");
            }
            first = false;
            let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
            let _ = write!(out, "PARTITION p{} VALUES IN ({})", i, ids.join(","));
        }
        out.push(')');
    }

    /// CREATE statements for one table
    pub fn table_statements(&self, def: &TableDef) -> Vec<String> {
        let name = def.table.name();
        let mut lines: Vec<String> = def.columns.iter().map(|c| c.to_string()).collect();
        if let Some(pk) = def.primary_key {
            lines.push(format!("PRIMARY KEY ({})", pk));
        }
        let inline_indexes = self.dialect.supports_inline_indexes();
        if inline_indexes {
            for (index, columns) in def.indexes {
                lines.push(format!("INDEX {} ({})", index, columns));
            }
        }

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\t{}\n)",
            name,
            lines.join(",\n\t")
        );
        let create = match def.partition_key {
            Some(key) => self.append_partition(&create, key),
            None => create,
        };

        let mut statements = vec![create];
        if !inline_indexes {
            for (index, columns) in def.indexes {
                statements.push(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    index, name, columns
                ));
            }
        }
        statements
    }

    /// ALTER TABLE statements adding foreign keys
    pub fn foreign_key_statements(&self) -> Vec<String> {
        FOREIGN_KEYS
            .iter()
            .map(|(table, name, columns, ref_table, ref_columns)| {
                format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    table, name, columns, ref_table, ref_columns
                )
            })
            .collect()
    }

    /// Every statement `create_tables` runs, in order
    pub fn create_statements(&self) -> Vec<String> {
        let mut statements: Vec<String> = TABLE_DEFS
            .iter()
            .flat_map(|def| self.table_statements(def))
            .collect();
        if self.use_fk && self.dialect.supports_alter_foreign_keys() {
            statements.extend(self.foreign_key_statements());
        }
        statements
    }

    /// Create all nine tables (and foreign keys if configured)
    pub fn create_tables(&self, conn: &mut dyn Connection) -> Result<()> {
        for def in &TABLE_DEFS {
            info!(target: "tpcc::ddl", table = %def.table, "Creating table");
            for sql in self.table_statements(def) {
                conn.execute_sql(&sql, &[]).with_query(&sql)?;
            }
        }
        if self.use_fk {
            if !self.dialect.supports_alter_foreign_keys() {
                warn!(target: "tpcc::ddl", dialect = %self.dialect, "foreign keys not supported, skipping");
                return Ok(());
            }
            for sql in self.foreign_key_statements() {
                conn.execute_sql(&sql, &[]).with_query(&sql)?;
            }
        }
        Ok(())
    }

    /// Drop all nine tables, children before parents; the first failure aborts
    pub fn drop_tables(&self, conn: &mut dyn Connection) -> Result<()> {
        for def in TABLE_DEFS.iter().rev() {
            info!(target: "tpcc::ddl", table = %def.table, "Dropping table");
            let sql = format!("DROP TABLE IF EXISTS {}", def.table.name());
            conn.execute_sql(&sql, &[]).with_query(&sql)?;
        }
        Ok(())
    }
}
