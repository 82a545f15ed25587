//! Cell values moved between source and destination.
//!
//! Every cell read from the source is decoded into a [`SqlValue`] so that
//! sanitization can match on the variant instead of inspecting driver types.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Textual forms of the MySQL zero date.
pub const ZERO_DATE: &str = "0000-00-00";
pub const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// One cell of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Signed integer of any width.
    Int(i64),

    /// Unsigned integer that does not fit in `i64`.
    UInt(u64),

    /// FLOAT or DOUBLE.
    Float(f64),

    /// Character data, DECIMAL, JSON, ENUM and SET.
    Text(String),

    /// Binary string data.
    Bytes(Vec<u8>),

    /// DATE.
    Date(NaiveDate),

    /// DATETIME or TIMESTAMP.
    DateTime(NaiveDateTime),

    /// The all-zero date/datetime sentinel, which has no calendar value.
    ZeroDate,

    /// TIME, kept in its `[-]HHH:MM:SS[.ffffff]` text form since it is an
    /// interval that can exceed 24 hours.
    Time(String),
}

impl SqlValue {
    /// Whether this value is a zero date in any of its representations:
    /// the sentinel itself, its text or byte form, or a year-0 date.
    #[must_use]
    pub fn is_zero_date(&self) -> bool {
        match self {
            SqlValue::ZeroDate => true,
            SqlValue::Text(s) => s == ZERO_DATE || s == ZERO_DATETIME,
            SqlValue::Bytes(b) => b == ZERO_DATE.as_bytes() || b == ZERO_DATETIME.as_bytes(),
            SqlValue::Date(d) => d.year() == 0,
            SqlValue::DateTime(dt) => dt.year() == 0,
            _ => false,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// A row, one value per column in ordinal order.
pub type Row = Vec<SqlValue>;

/// A page of rows read from a table.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Rows in read order.
    pub rows: Vec<Row>,
}

impl Batch {
    /// Create a new batch with the given rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Get the number of rows in this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
