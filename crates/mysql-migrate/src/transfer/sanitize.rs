//! Zero-date sanitization.
//!
//! MySQL sources in permissive SQL modes hold `0000-00-00` dates that a
//! strict destination rejects. Each zero date is replaced either with a
//! configured placeholder for its table and column, or with NULL.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{MigrationConfig, ZeroDatePlaceholder};
use crate::core::schema::Column;
use crate::core::value::{Row, SqlValue};

/// Table+column aware replacement map for zero dates.
#[derive(Debug, Clone, Default)]
pub struct ZeroDatePolicy {
    placeholders: HashMap<(String, String), NaiveDate>,
}

impl ZeroDatePolicy {
    /// Build a policy from placeholder entries. Later entries win.
    pub fn new(placeholders: &[ZeroDatePlaceholder]) -> Self {
        let placeholders = placeholders
            .iter()
            .map(|p| ((p.table.clone(), p.column.clone()), p.value))
            .collect();
        Self { placeholders }
    }

    /// Build the policy configured for a run.
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(&config.zero_date_placeholders)
    }

    /// Placeholder configured for a table/column pair, if any.
    pub fn placeholder(&self, table: &str, column: &str) -> Option<NaiveDate> {
        self.placeholders
            .get(&(table.to_string(), column.to_string()))
            .copied()
    }

    /// Replacement for `value`, or `None` if it is not a zero date.
    fn replacement(&self, table: &str, column: &str, value: &SqlValue) -> Option<SqlValue> {
        if !value.is_zero_date() {
            return None;
        }
        Some(match self.placeholder(table, column) {
            Some(date) => SqlValue::Date(date),
            None => SqlValue::Null,
        })
    }

    /// Replace one value if it is a zero date.
    pub fn sanitize_value(&self, table: &str, column: &str, value: SqlValue) -> SqlValue {
        self.replacement(table, column, &value).unwrap_or(value)
    }

    /// Sanitize a row in place; values pair with `columns` by position.
    /// Returns the number of values replaced.
    pub fn sanitize_row(&self, table: &str, columns: &[Column], row: &mut Row) -> usize {
        let mut replaced = 0;
        for (value, column) in row.iter_mut().zip(columns) {
            if let Some(new_value) = self.replacement(table, &column.name, value) {
                *value = new_value;
                replaced += 1;
            }
        }
        replaced
    }

    /// Sanitize every row of a page. Returns the number of values replaced.
    pub fn sanitize_rows(&self, table: &str, columns: &[Column], rows: &mut [Row]) -> usize {
        let replaced: usize = rows
            .iter_mut()
            .map(|row| self.sanitize_row(table, columns, row))
            .sum();
        if replaced > 0 {
            debug!("{}: replaced {} zero-date values", table, replaced);
        }
        replaced
    }
}
