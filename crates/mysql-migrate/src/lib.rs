//! # mysql-migrate
//!
//! Dependency-ordered MySQL to MySQL schema and data migration library.
//!
//! A run reads every base table of the source database, orders the tables
//! so that each one follows the tables its foreign keys reference, then
//! replays each table's `CREATE TABLE` on the destination and copies its
//! rows in fixed-size pages:
//!
//! - **Dependency ordering** by depth-first topological sort with cycle
//!   detection
//! - **Verbatim DDL replay** from `SHOW CREATE TABLE`
//! - **Batched transfer** with one prepared insert per table
//! - **Zero-date sanitization**, table and column aware
//! - **Foreign key checks disabled** on the destination for the whole run
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> mysql_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::connect(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("Migrated {} rows", result.rows_migrated);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, MigrationConfig, ZeroDatePlaceholder};
pub use core::{sort_tables_by_dependencies, Column, DependencyGraph, ForeignKey, SqlValue};
pub use core::{SourceReader, TargetWriter};
pub use drivers::{MysqlReader, MysqlWriter};
pub use error::{MigrateError, Result, Side};
pub use orchestrator::{
    HealthCheckResult, MigrationPlan, MigrationResult, Orchestrator, ValidationReport,
};
pub use state::{RunPhase, RunState, TableState, TaskStatus};
pub use transfer::{TransferConfig, TransferEngine, TransferStats, ZeroDatePolicy};
