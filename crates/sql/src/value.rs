//! Driver-neutral parameter values and result rows
//!
//! Numeric accessors on `Row` are lenient: relational engines disagree on how
//! DECIMAL columns come back (SQLite hands out integers for whole values,
//! MySQL drivers often return text), so `get_f64` accepts integers, floats and
//! numeric text alike.

use crate::error::{Error, Result};

/// A single SQL parameter or column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
}

impl SqlValue {
    /// Name of the variant, used in conversion errors
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
        }
    }

    /// Check if this is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Wrap column values
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All column values
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Raw column value
    pub fn get(&self, column: usize) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Check if a column is NULL (missing columns count as NULL)
    pub fn is_null(&self, column: usize) -> bool {
        self.get(column).map_or(true, SqlValue::is_null)
    }

    fn column(&self, column: usize, expected: &'static str) -> Result<&SqlValue> {
        self.values.get(column).ok_or(Error::Conversion {
            column,
            expected,
            actual: "missing",
        })
    }

    /// Column as an integer
    pub fn get_i64(&self, column: usize) -> Result<i64> {
        let value = self.column(column, "int")?;
        match value {
            SqlValue::Int(v) => Ok(*v),
            SqlValue::Float(v) if v.fract() == 0.0 => Ok(*v as i64),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| mismatch(column, "int", value)),
            _ => Err(mismatch(column, "int", value)),
        }
    }

    /// Column as an integer, NULL mapped to `None`
    pub fn get_opt_i64(&self, column: usize) -> Result<Option<i64>> {
        if self.is_null(column) {
            return Ok(None);
        }
        self.get_i64(column).map(Some)
    }

    /// Column as a float
    pub fn get_f64(&self, column: usize) -> Result<f64> {
        let value = self.column(column, "float")?;
        match value {
            SqlValue::Int(v) => Ok(*v as f64),
            SqlValue::Float(v) => Ok(*v),
            SqlValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| mismatch(column, "float", value)),
            SqlValue::Null => Err(mismatch(column, "float", value)),
        }
    }

    /// Column as text
    pub fn get_str(&self, column: usize) -> Result<&str> {
        match self.column(column, "text")? {
            SqlValue::Text(s) => Ok(s),
            other => Err(mismatch(column, "text", other)),
        }
    }
}

fn mismatch(column: usize, expected: &'static str, value: &SqlValue) -> Error {
    Error::Conversion {
        column,
        expected,
        actual: value.type_name(),
    }
}
