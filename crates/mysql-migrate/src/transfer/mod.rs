//! Batched data transfer.
//!
//! A table is moved in offset/limit pages of `batch_size` rows. Each page
//! is read fully, sanitized, then written through one insert statement
//! prepared once per table. Pages never overlap: the next page is read
//! only after the previous one has been written.

mod sanitize;

pub use sanitize::ZeroDatePolicy;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::MigrationConfig;
use crate::core::schema::Column;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::error::Result;
use crate::state::TableState;

/// Transfer configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Rows per page.
    pub batch_size: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl From<&MigrationConfig> for TransferConfig {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            batch_size: config.batch_size as u64,
        }
    }
}

/// Statistics from moving one table.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    /// Time spent reading pages.
    pub read_time: Duration,

    /// Time spent writing pages.
    pub write_time: Duration,

    /// Total rows written.
    pub rows: u64,

    /// Pages read.
    pub pages: u64,

    /// Zero-date values replaced by sanitization.
    pub zero_dates_replaced: u64,
}

/// Transfer engine for moving one table's rows at a time.
pub struct TransferEngine {
    config: TransferConfig,
    policy: ZeroDatePolicy,
}

impl TransferEngine {
    /// Create a new transfer engine.
    pub fn new(config: TransferConfig, policy: ZeroDatePolicy) -> Self {
        Self { config, policy }
    }

    /// Create an engine from the run configuration.
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(
            TransferConfig::from(config),
            ZeroDatePolicy::from_config(config),
        )
    }

    /// Rows per page.
    pub fn batch_size(&self) -> u64 {
        self.config.batch_size
    }

    /// Move all rows of `table` from `source` to `target`.
    ///
    /// The row count is fetched once. An empty table prepares nothing. Any
    /// read or write error aborts the table immediately; progress so far is
    /// left in `state`.
    pub async fn migrate_table_data<S, T>(
        &self,
        source: &mut S,
        target: &mut T,
        table: &str,
        columns: &[Column],
        state: &mut TableState,
    ) -> Result<TransferStats>
    where
        S: SourceReader,
        T: TargetWriter,
    {
        let total = source.get_row_count(table).await?;
        state.rows_total = total;

        if total == 0 {
            info!("Table {} is empty, skipping data migration", table);
            return Ok(TransferStats::default());
        }

        info!(
            "Migrating {} rows from {} in batches of {}",
            total, table, self.config.batch_size
        );

        let statement = target.prepare_insert(table, columns).await?;
        let result = self
            .copy_pages(source, target, table, columns, &statement, total, state)
            .await;
        let closed = target.close_statement(table, statement).await;

        match (result, closed) {
            (Ok(stats), Ok(())) => Ok(stats),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to release insert for {}: {}", table, close_err);
                }
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn copy_pages<S, T>(
        &self,
        source: &mut S,
        target: &mut T,
        table: &str,
        columns: &[Column],
        statement: &T::Statement,
        total: u64,
        state: &mut TableState,
    ) -> Result<TransferStats>
    where
        S: SourceReader,
        T: TargetWriter,
    {
        let limit = self.config.batch_size.max(1);
        let mut stats = TransferStats::default();
        let mut offset = 0u64;

        // The offset advances by a full page even after a short read, so a
        // short last page ends the loop.
        while offset < total {
            let read_start = Instant::now();
            let mut batch = source.read_page(table, columns, limit, offset).await?;
            stats.read_time += read_start.elapsed();
            stats.pages += 1;

            let replaced = self.policy.sanitize_rows(table, columns, &mut batch.rows);
            stats.zero_dates_replaced += replaced as u64;

            let write_start = Instant::now();
            let written = target.write_rows(table, statement, batch.rows).await?;
            stats.write_time += write_start.elapsed();
            stats.rows += written;

            state.rows_migrated += written;
            info!(
                "Table {}: {}/{} rows migrated ({:.2}%)",
                table,
                state.rows_migrated,
                total,
                state.progress_percent()
            );

            offset += limit;
        }

        debug!(
            "{}: {} pages, read {:?}, write {:?}",
            table, stats.pages, stats.read_time, stats.write_time
        );
        Ok(stats)
    }
}
