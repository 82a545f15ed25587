//! Core traits for the migration engine.
//!
//! - [`SourceReader`]: inspects the source schema and reads pages of rows
//! - [`TargetWriter`]: creates tables, writes rows and toggles foreign key
//!   checks on the destination
//!
//! Both traits take `&mut self`: each implementation owns exactly one
//! session, and the orchestrator drives them strictly sequentially.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{Column, ForeignKey};
use super::value::{Batch, Row};

/// Read schema and data from the source database.
#[async_trait]
pub trait SourceReader: Send {
    /// List base tables in enumeration order, excluding any name in `skip`.
    async fn list_tables(&mut self, skip: &HashSet<String>) -> Result<Vec<String>>;

    /// Columns of a table in ordinal order.
    async fn get_columns(&mut self, table: &str) -> Result<Vec<Column>>;

    /// Foreign keys owned by a table whose referenced table is known.
    async fn get_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>>;

    /// The table's native `CREATE TABLE` statement.
    async fn get_schema_definition(&mut self, table: &str) -> Result<String>;

    /// Total number of rows in a table.
    async fn get_row_count(&mut self, table: &str) -> Result<u64>;

    /// Read up to `limit` rows starting at `offset`, values in `columns` order.
    async fn read_page(
        &mut self,
        table: &str,
        columns: &[Column],
        limit: u64,
        offset: u64,
    ) -> Result<Batch>;

    /// Release the connection.
    async fn close(self) -> Result<()>;
}

/// Write schema and data to the destination database.
#[async_trait]
pub trait TargetWriter: Send {
    /// Handle for an insert statement prepared for one table.
    type Statement: Send + Sync;

    /// Execute a `CREATE TABLE` statement as-is.
    async fn create_table(&mut self, table: &str, definition: &str) -> Result<()>;

    /// Prepare an `INSERT` covering `columns` in ordinal order.
    async fn prepare_insert(&mut self, table: &str, columns: &[Column]) -> Result<Self::Statement>;

    /// Execute the prepared insert once per row. Returns rows written.
    async fn write_rows(
        &mut self,
        table: &str,
        statement: &Self::Statement,
        rows: Vec<Row>,
    ) -> Result<u64>;

    /// Release a prepared statement.
    async fn close_statement(&mut self, table: &str, statement: Self::Statement) -> Result<()>;

    /// `SET FOREIGN_KEY_CHECKS = 0` on the writer's session.
    async fn disable_foreign_key_checks(&mut self) -> Result<()>;

    /// `SET FOREIGN_KEY_CHECKS = 1` on the writer's session.
    async fn enable_foreign_key_checks(&mut self) -> Result<()>;

    /// Total number of rows in a destination table.
    async fn get_row_count(&mut self, table: &str) -> Result<u64>;

    /// Release the connection.
    async fn close(self) -> Result<()>;
}
