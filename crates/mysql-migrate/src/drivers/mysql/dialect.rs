//! MySQL SQL text for inspection, paging and inserts.

use crate::core::schema::Column;

/// Quote a MySQL identifier, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quoted, comma-separated column list in ordinal order.
pub fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Base tables only; views have no `CREATE TABLE` to replay.
pub const LIST_TABLES: &str = "SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'";

/// Foreign keys owned by one table, restricted to known referenced tables.
pub const FOREIGN_KEYS: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
        CAST(REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ?
      AND TABLE_NAME = ?
      AND REFERENCED_TABLE_NAME IS NOT NULL
    ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
"#;

/// `SHOW COLUMNS FROM t`.
pub fn show_columns(table: &str) -> String {
    format!("SHOW COLUMNS FROM {}", quote_ident(table))
}

/// `SHOW CREATE TABLE t`.
pub fn show_create_table(table: &str) -> String {
    format!("SHOW CREATE TABLE {}", quote_ident(table))
}

/// `SELECT COUNT(*) FROM t`.
pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

/// One offset/limit page; binds `(limit, offset)`.
///
/// Pages are ordered by the primary key when the table has one, so
/// consecutive offsets never overlap.
pub fn select_page(table: &str, columns: &[Column]) -> String {
    let pk: Vec<String> = columns
        .iter()
        .filter(|c| c.is_primary_key())
        .map(|c| quote_ident(&c.name))
        .collect();
    let order_by = if pk.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", pk.join(", "))
    };

    format!(
        "SELECT {} FROM {}{} LIMIT ? OFFSET ?",
        column_list(columns),
        quote_ident(table),
        order_by
    )
}

/// Single-row insert with one placeholder per column.
pub fn insert_row(table: &str, columns: &[Column]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list(columns),
        placeholders
    )
}

pub const DISABLE_FOREIGN_KEY_CHECKS: &str = "SET FOREIGN_KEY_CHECKS = 0";
pub const ENABLE_FOREIGN_KEY_CHECKS: &str = "SET FOREIGN_KEY_CHECKS = 1";
