//! Conversion between `mysql_async::Value` and [`SqlValue`].
//!
//! Rows are read over the binary protocol, so temporal columns arrive as
//! `Value::Date`/`Value::Time` and zero dates are visible as all-zero
//! components instead of failing to decode.

use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::Value;

use crate::core::schema::Column;
use crate::core::value::SqlValue;

/// Decode one source cell.
pub fn from_mysql(value: Value, column: &Column) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => {
            if column.is_binary() {
                SqlValue::Bytes(bytes)
            } else {
                match String::from_utf8(bytes) {
                    Ok(s) => SqlValue::Text(s),
                    Err(e) => SqlValue::Bytes(e.into_bytes()),
                }
            }
        }
        Value::Int(v) => SqlValue::Int(v),
        Value::UInt(v) => match i64::try_from(v) {
            Ok(v) => SqlValue::Int(v),
            Err(_) => SqlValue::UInt(v),
        },
        Value::Float(v) => SqlValue::Float(v as f64),
        Value::Double(v) => SqlValue::Float(v),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            decode_date(column, year, month, day, hour, minute, second, micros)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            SqlValue::Time(format_time(negative, days, hours, minutes, seconds, micros))
        }
    }
}

/// Encode one value for the destination.
pub fn to_mysql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(v) => Value::Int(v),
        SqlValue::UInt(v) => Value::UInt(v),
        SqlValue::Float(v) => Value::Double(v),
        SqlValue::Text(s) => Value::Bytes(s.into_bytes()),
        SqlValue::Bytes(b) => Value::Bytes(b),
        SqlValue::Date(d) => Value::Date(
            d.year() as u16,
            d.month() as u8,
            d.day() as u8,
            0,
            0,
            0,
            0,
        ),
        SqlValue::DateTime(dt) => Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1_000,
        ),
        SqlValue::ZeroDate => Value::Date(0, 0, 0, 0, 0, 0, 0),
        SqlValue::Time(s) => Value::Bytes(s.into_bytes()),
    }
}

/// Encode a whole row in ordinal order.
pub fn row_to_params(row: Vec<SqlValue>) -> Vec<Value> {
    row.into_iter().map(to_mysql).collect()
}

#[allow(clippy::too_many_arguments)]
fn decode_date(
    column: &Column,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> SqlValue {
    if (year, month, day, hour, minute, second, micros) == (0, 0, 0, 0, 0, 0, 0) {
        return SqlValue::ZeroDate;
    }

    let Some(date) = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) else {
        // Partial zero dates like 2020-00-15 have no calendar value;
        // pass them through in MySQL's own text form.
        return SqlValue::Text(format_datetime(year, month, day, hour, minute, second, micros));
    };

    if column.base_type() == "date" {
        return SqlValue::Date(date);
    }

    match date.and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros) {
        Some(dt) => SqlValue::DateTime(dt),
        None => SqlValue::Text(format_datetime(year, month, day, hour, minute, second, micros)),
    }
}

fn format_datetime(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> String {
    let mut s = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, minute, second
    );
    if micros > 0 {
        s.push_str(&format!(".{:06}", micros));
    }
    s
}

fn format_time(
    negative: bool,
    days: u32,
    hours: u8,
    minutes: u8,
    seconds: u8,
    micros: u32,
) -> String {
    let sign = if negative { "-" } else { "" };
    let total_hours = days * 24 + hours as u32;
    let mut s = format!("{}{:02}:{:02}:{:02}", sign, total_hours, minutes, seconds);
    if micros > 0 {
        s.push_str(&format!(".{:06}", micros));
    }
    s
}
