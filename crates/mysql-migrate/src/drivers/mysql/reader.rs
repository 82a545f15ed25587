//! MySQL source reader: schema inspection and paged row reads.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row};
use tracing::debug;

use super::connection::connect;
use super::convert::from_mysql;
use super::dialect;
use crate::config::DatabaseConfig;
use crate::core::schema::{Column, ForeignKey};
use crate::core::traits::SourceReader;
use crate::core::value::{Batch, SqlValue};
use crate::error::{MigrateError, Result, Side};

/// MySQL source reader holding one dedicated connection.
pub struct MysqlReader {
    conn: Conn,
    database: String,
}

impl MysqlReader {
    /// Connect to the source database.
    pub async fn connect(config: &DatabaseConfig, timeout: Duration) -> Result<Self> {
        let conn = connect(config, Side::Source, timeout).await?;
        Ok(Self {
            conn,
            database: config.database.clone(),
        })
    }
}

/// Read column `idx` as an optional string.
fn string_at(row: &Row, idx: usize, table: &str) -> Result<Option<String>> {
    match row.get_opt::<Option<String>, usize>(idx) {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(MigrateError::inspection(table, format!("column {}: {}", idx, e))),
        None => Err(MigrateError::inspection(table, format!("no column {}", idx))),
    }
}

/// Read column `idx` as a required string.
fn required_string_at(row: &Row, idx: usize, table: &str) -> Result<String> {
    string_at(row, idx, table)?
        .ok_or_else(|| MigrateError::inspection(table, format!("column {} is NULL", idx)))
}

#[async_trait]
impl SourceReader for MysqlReader {
    async fn list_tables(&mut self, skip: &HashSet<String>) -> Result<Vec<String>> {
        let rows: Vec<Row> = self.conn.query(dialect::LIST_TABLES).await.map_err(|e| {
            MigrateError::inspection(&self.database, format!("listing tables: {}", e))
        })?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = required_string_at(row, 0, &self.database)?;
            if skip.contains(&name) {
                debug!("Skipping table {}", name);
                continue;
            }
            tables.push(name);
        }

        Ok(tables)
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let rows: Vec<Row> = self
            .conn
            .query(dialect::show_columns(table))
            .await
            .map_err(|e| MigrateError::inspection(table, format!("reading columns: {}", e)))?;

        // Field, Type, Null, Key, Default, Extra
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(Column {
                name: required_string_at(row, 0, table)?,
                data_type: required_string_at(row, 1, table)?,
                is_nullable: string_at(row, 2, table)?.as_deref() == Some("YES"),
                key: string_at(row, 3, table)?.unwrap_or_default(),
                default: string_at(row, 4, table)?,
                extra: string_at(row, 5, table)?.unwrap_or_default(),
            });
        }

        debug!("Loaded {} columns for {}", columns.len(), table);
        Ok(columns)
    }

    async fn get_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<Row> = self
            .conn
            .exec(dialect::FOREIGN_KEYS, (self.database.as_str(), table))
            .await
            .map_err(|e| MigrateError::inspection(table, format!("reading foreign keys: {}", e)))?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in &rows {
            // COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME
            foreign_keys.push(ForeignKey {
                table: table.to_string(),
                column: required_string_at(row, 0, table)?,
                ref_table: required_string_at(row, 1, table)?,
                ref_column: required_string_at(row, 2, table)?,
            });
        }

        debug!("Loaded {} foreign keys for {}", foreign_keys.len(), table);
        Ok(foreign_keys)
    }

    async fn get_schema_definition(&mut self, table: &str) -> Result<String> {
        let row: Option<Row> = self
            .conn
            .query_first(dialect::show_create_table(table))
            .await
            .map_err(|e| MigrateError::inspection(table, format!("reading definition: {}", e)))?;

        let row = row.ok_or_else(|| MigrateError::inspection(table, "no CREATE TABLE output"))?;
        // Table, Create Table
        required_string_at(&row, 1, table)
    }

    async fn get_row_count(&mut self, table: &str) -> Result<u64> {
        let count: Option<u64> = self
            .conn
            .query_first(dialect::count_rows(table))
            .await
            .map_err(|e| MigrateError::inspection(table, format!("counting rows: {}", e)))?;

        Ok(count.unwrap_or(0))
    }

    async fn read_page(
        &mut self,
        table: &str,
        columns: &[Column],
        limit: u64,
        offset: u64,
    ) -> Result<Batch> {
        let sql = dialect::select_page(table, columns);
        let rows: Vec<Row> = self.conn.exec(sql, (limit, offset)).await.map_err(|e| {
            MigrateError::data_read(table, format!("page at offset {}: {}", offset, e))
        })?;

        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        row.take::<mysql_async::Value, usize>(i)
                            .map(|v| from_mysql(v, col))
                            .unwrap_or(SqlValue::Null)
                    })
                    .collect()
            })
            .collect();

        Ok(Batch::new(rows))
    }

    async fn close(self) -> Result<()> {
        self.conn
            .disconnect()
            .await
            .map_err(|e| MigrateError::connection(Side::Source, format!("disconnect: {}", e)))
    }
}
