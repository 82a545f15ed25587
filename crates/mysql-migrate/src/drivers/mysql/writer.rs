//! MySQL destination writer.
//!
//! Holds one dedicated connection: `FOREIGN_KEY_CHECKS` is a session
//! variable, so the toggle only covers inserts issued on the same session.

use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Statement};
use tracing::debug;

use super::connection::connect;
use super::convert::row_to_params;
use super::dialect;
use crate::config::DatabaseConfig;
use crate::core::schema::Column;
use crate::core::traits::TargetWriter;
use crate::core::value::Row;
use crate::error::{MigrateError, Result, Side};

/// MySQL destination writer.
pub struct MysqlWriter {
    conn: Conn,
}

impl MysqlWriter {
    /// Connect to the destination database.
    pub async fn connect(config: &DatabaseConfig, timeout: Duration) -> Result<Self> {
        let conn = connect(config, Side::Destination, timeout).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    type Statement = Statement;

    async fn create_table(&mut self, table: &str, definition: &str) -> Result<()> {
        self.conn
            .query_drop(definition)
            .await
            .map_err(|e| MigrateError::schema_creation(table, e))?;

        debug!("Created table {}", table);
        Ok(())
    }

    async fn prepare_insert(&mut self, table: &str, columns: &[Column]) -> Result<Statement> {
        let sql = dialect::insert_row(table, columns);
        self.conn
            .prep(sql)
            .await
            .map_err(|e| MigrateError::data_write(table, format!("preparing insert: {}", e)))
    }

    async fn write_rows(
        &mut self,
        table: &str,
        statement: &Statement,
        rows: Vec<Row>,
    ) -> Result<u64> {
        let count = rows.len() as u64;
        if count == 0 {
            return Ok(0);
        }

        let params = rows.into_iter().map(row_to_params);
        self.conn
            .exec_batch(statement.clone(), params)
            .await
            .map_err(|e| MigrateError::data_write(table, e))?;

        Ok(count)
    }

    async fn close_statement(&mut self, table: &str, statement: Statement) -> Result<()> {
        self.conn
            .close(statement)
            .await
            .map_err(|e| MigrateError::data_write(table, format!("closing insert: {}", e)))
    }

    async fn disable_foreign_key_checks(&mut self) -> Result<()> {
        self.conn
            .query_drop(dialect::DISABLE_FOREIGN_KEY_CHECKS)
            .await
            .map_err(|e| MigrateError::ConstraintToggle(format!("disable: {}", e)))
    }

    async fn enable_foreign_key_checks(&mut self) -> Result<()> {
        self.conn
            .query_drop(dialect::ENABLE_FOREIGN_KEY_CHECKS)
            .await
            .map_err(|e| MigrateError::ConstraintToggle(format!("enable: {}", e)))
    }

    async fn get_row_count(&mut self, table: &str) -> Result<u64> {
        let count: Option<u64> = self
            .conn
            .query_first(dialect::count_rows(table))
            .await
            .map_err(|e| MigrateError::inspection(table, format!("counting rows: {}", e)))?;

        Ok(count.unwrap_or(0))
    }

    async fn close(self) -> Result<()> {
        self.conn
            .disconnect()
            .await
            .map_err(|e| MigrateError::connection(Side::Destination, format!("disconnect: {}", e)))
    }
}
