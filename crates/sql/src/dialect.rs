//! SQL dialect differences the workload depends on

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dialect of the target relational engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL-compatible engines (row locks, partitioning, STRAIGHT_JOIN)
    #[default]
    MySql,
    /// SQLite (database-level write lock, no partitioning)
    Sqlite,
}

impl Dialect {
    /// Suffix that turns a SELECT into a locking read
    pub fn for_update(self) -> &'static str {
        match self {
            Dialect::MySql => " FOR UPDATE",
            Dialect::Sqlite => "",
        }
    }

    /// Append the locking-read suffix to a SELECT
    pub fn locking_read(self, select: &str) -> String {
        format!("{}{}", select, self.for_update())
    }

    /// Join keyword that forces left-to-right join order where supported
    pub fn straight_join(self) -> &'static str {
        match self {
            Dialect::MySql => "STRAIGHT_JOIN",
            Dialect::Sqlite => "JOIN",
        }
    }

    /// Right-hand side of a row-value `IN` predicate with `rows` tuples of
    /// `arity` placeholders each.
    ///
    /// MySQL accepts a parenthesized tuple list; SQLite requires the
    /// right-hand side to be a subquery, so a VALUES list is used there.
    pub fn row_values_in(self, arity: usize, rows: usize) -> String {
        let tuple = format!("({})", placeholders(arity));
        let tuples = vec![tuple; rows].join(",");
        match self {
            Dialect::MySql => format!("({})", tuples),
            Dialect::Sqlite => format!("(VALUES {})", tuples),
        }
    }

    /// Whether `PARTITION BY` clauses can be appended to CREATE TABLE
    pub fn supports_partitioning(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Whether secondary indexes are declared inside CREATE TABLE
    pub fn supports_inline_indexes(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Whether `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY` is supported
    pub fn supports_alter_foreign_keys(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

/// `n` comma-separated `?` placeholders
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "tidb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}
