//! Migration orchestrator - main workflow coordinator.
//!
//! A run moves through these phases in order:
//!
//! 1. Inspecting: list source tables (minus the skip list) and their
//!    foreign keys
//! 2. Sorting: order tables so referenced tables come first
//! 3. ConstraintsDisabled: `FOREIGN_KEY_CHECKS = 0` on the destination
//! 4. MigratingTable(i): replay `CREATE TABLE`, then move rows in batches
//! 5. ConstraintsRestored: `FOREIGN_KEY_CHECKS = 1`
//! 6. Done
//!
//! Nothing on the destination is touched before phase 3, so inspection and
//! sorting failures leave it unchanged. A failure in phase 4 re-enables
//! foreign key checks on a best-effort basis: an error from that attempt is
//! logged and the table failure is returned.

use crate::config::Config;
use crate::core::{
    sort_tables_by_dependencies, DependencyGraph, ForeignKey, SourceReader, TargetWriter,
};
use crate::drivers::mysql::{probe, MysqlReader, MysqlWriter};
use crate::error::{Result, Side};
use crate::state::{RunPhase, RunState, TableState, TaskStatus};
use crate::transfer::TransferEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Migration orchestrator.
///
/// Owns one source session and one destination session for the whole run;
/// every entry point consumes the orchestrator and closes both.
pub struct Orchestrator<S, T> {
    config: Config,
    source: S,
    target: T,
    engine: TransferEngine,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total tables processed.
    pub tables_total: usize,

    /// Tables successfully migrated.
    pub tables_success: usize,

    /// Total rows migrated.
    pub rows_migrated: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Tables in the order they were migrated.
    pub migration_order: Vec<String>,

    /// Per-table outcome.
    pub tables: Vec<TableSummary>,
}

/// Outcome for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
    pub status: TaskStatus,
}

/// Output of a dry run: what a real run would do, in order.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub tables: Vec<PlannedTable>,
}

/// One table of a dry-run plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTable {
    pub name: String,

    /// Tables in the run that must be created first.
    pub depends_on: Vec<String>,

    /// Source row count at planning time.
    pub rows: u64,
}

impl MigrationPlan {
    /// Table names in migration order.
    pub fn order(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }
}

/// Row counts of one table on both sides.
#[derive(Debug, Clone, Serialize)]
pub struct TableValidation {
    pub table: String,
    pub source_rows: u64,

    /// `None` if the table is missing on the destination.
    pub destination_rows: Option<u64>,

    pub matches: bool,
}

/// Row-count comparison across all migrated tables.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub tables: Vec<TableValidation>,
}

impl ValidationReport {
    /// Whether every table has the same row count on both sides.
    pub fn all_match(&self) -> bool {
        self.tables.iter().all(|t| t.matches)
    }

    /// Tables whose counts differ.
    pub fn mismatched(&self) -> Vec<&TableValidation> {
        self.tables.iter().filter(|t| !t.matches).collect()
    }
}

/// Connectivity of both sides.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub destination_connected: bool,
    pub destination_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator<MysqlReader, MysqlWriter> {
    /// Connect to both databases.
    pub async fn connect(config: Config) -> Result<Self> {
        let timeout = config.migration.connect_timeout();

        let source = MysqlReader::connect(&config.source, timeout).await?;
        let target = match MysqlWriter::connect(&config.destination, timeout).await {
            Ok(target) => target,
            Err(e) => {
                if let Err(close_err) = source.close().await {
                    warn!("Failed to close source connection: {}", close_err);
                }
                return Err(e);
            }
        };

        Ok(Self::new(config, source, target))
    }

    /// Probe both databases without keeping the connections.
    pub async fn health_check(config: &Config) -> HealthCheckResult {
        let timeout = config.migration.connect_timeout();
        let source = probe(&config.source, Side::Source, timeout).await;
        let destination = probe(&config.destination, Side::Destination, timeout).await;

        HealthCheckResult {
            healthy: source.connected && destination.connected,
            source_connected: source.connected,
            source_latency_ms: source.latency_ms,
            source_error: source.error,
            destination_connected: destination.connected,
            destination_latency_ms: destination.latency_ms,
            destination_error: destination.error,
        }
    }
}

impl<S, T> Orchestrator<S, T>
where
    S: SourceReader,
    T: TargetWriter,
{
    /// Create an orchestrator over already-open sessions.
    pub fn new(config: Config, source: S, target: T) -> Self {
        let engine = TransferEngine::from_config(&config.migration);
        Self {
            config,
            source,
            target,
            engine,
        }
    }

    /// Run the migration.
    pub async fn run(mut self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut state = RunState::new(run_id.clone());

        info!("Starting migration run: {}", run_id);

        let outcome = self.execute(&mut state).await;
        self.close().await;

        let duration = start.elapsed();
        if let Err(e) = outcome {
            let phase = failed_phase(&state);
            state.mark_failed();
            error!(
                "Migration failed during {} after {:.2?}: {}",
                phase, duration, e
            );
            return Err(e);
        }

        state.mark_completed();
        info!("Migration completed in {:.2?}", duration);

        let result = MigrationResult::from_state(&state, started_at, duration.as_secs_f64());
        info!(
            "Migrated {} tables, {} rows ({} rows/s)",
            result.tables_success, result.rows_migrated, result.rows_per_second
        );
        Ok(result)
    }

    /// Inspect and sort only, reporting what a run would do.
    pub async fn plan(mut self) -> Result<MigrationPlan> {
        let outcome = self.build_plan().await;
        self.close().await;
        outcome
    }

    /// Compare per-table row counts between source and destination.
    pub async fn validate(mut self) -> Result<ValidationReport> {
        let outcome = self.compare_row_counts().await;
        self.close().await;
        outcome
    }

    async fn execute(&mut self, state: &mut RunState) -> Result<()> {
        // Phase 1: Inspecting
        state.enter(RunPhase::Inspecting);
        let (tables, foreign_keys) = self.inspect().await?;

        // Phase 2: Sorting
        state.enter(RunPhase::Sorting);
        let order = sort_tables_by_dependencies(&tables, &foreign_keys)?;
        info!("Migration order: {}", order.join(", "));
        state.set_order(&order);

        // Phase 3: ConstraintsDisabled
        self.target.disable_foreign_key_checks().await?;
        state.enter(RunPhase::ConstraintsDisabled);
        info!("Foreign key checks disabled on destination");

        // Phase 4: MigratingTable(i)
        if let Err(e) = self.migrate_tables(&order, state).await {
            match self.target.enable_foreign_key_checks().await {
                Ok(()) => info!("Foreign key checks re-enabled after failure"),
                Err(enable_err) => error!(
                    "Failed to re-enable foreign key checks after failure: {}",
                    enable_err
                ),
            }
            return Err(e);
        }

        // Phase 5: ConstraintsRestored
        self.target.enable_foreign_key_checks().await?;
        state.enter(RunPhase::ConstraintsRestored);
        info!("Foreign key checks re-enabled on destination");

        Ok(())
    }

    /// List tables and collect each table's foreign keys.
    async fn inspect(&mut self) -> Result<(Vec<String>, HashMap<String, Vec<ForeignKey>>)> {
        info!("Inspecting source schema");
        let skip = self.config.migration.skip_set();
        let tables = self.source.list_tables(&skip).await?;
        info!(
            "Found {} tables to migrate: {}",
            tables.len(),
            tables.join(", ")
        );

        let mut foreign_keys = HashMap::with_capacity(tables.len());
        for table in &tables {
            let fks = self.source.get_foreign_keys(table).await?;
            debug!("{}: {} foreign keys", table, fks.len());
            foreign_keys.insert(table.clone(), fks);
        }

        Ok((tables, foreign_keys))
    }

    async fn migrate_tables(&mut self, order: &[String], state: &mut RunState) -> Result<()> {
        let total = order.len();
        for (i, table) in order.iter().enumerate() {
            state.enter(RunPhase::MigratingTable(i));
            info!("Migrating table {}/{}: {}", i + 1, total, table);

            let mut table_state = TableState::new();
            table_state.mark_in_progress();
            let result = self.migrate_table(table, &mut table_state).await;
            match &result {
                Ok(()) => {
                    table_state.mark_completed();
                    info!(
                        "Completed table {} ({} rows)",
                        table, table_state.rows_migrated
                    );
                }
                Err(e) => {
                    table_state.mark_failed(&e.to_string());
                    error!("Table {} failed: {}", table, e);
                }
            }
            if let Some(slot) = state.table_mut(i) {
                *slot = table_state;
            }
            result?;
        }
        Ok(())
    }

    /// Create one table on the destination and move its rows.
    async fn migrate_table(&mut self, table: &str, table_state: &mut TableState) -> Result<()> {
        let definition = self.source.get_schema_definition(table).await?;
        self.target.create_table(table, &definition).await?;
        info!("Created table {}", table);

        let columns = self.source.get_columns(table).await?;
        self.engine
            .migrate_table_data(
                &mut self.source,
                &mut self.target,
                table,
                &columns,
                table_state,
            )
            .await?;
        Ok(())
    }

    async fn build_plan(&mut self) -> Result<MigrationPlan> {
        let (tables, foreign_keys) = self.inspect().await?;
        let graph = DependencyGraph::build(&tables, &foreign_keys);
        let order = graph.topological_order()?;
        info!("Migration order: {}", order.join(", "));

        let mut planned = Vec::with_capacity(order.len());
        for name in order {
            let rows = self.source.get_row_count(&name).await?;
            let depends_on = graph.dependencies(&name).to_vec();
            planned.push(PlannedTable {
                name,
                depends_on,
                rows,
            });
        }

        Ok(MigrationPlan { tables: planned })
    }

    async fn compare_row_counts(&mut self) -> Result<ValidationReport> {
        let skip = self.config.migration.skip_set();
        let tables = self.source.list_tables(&skip).await?;
        let mut results = Vec::with_capacity(tables.len());

        for table in tables {
            let source_rows = self.source.get_row_count(&table).await?;
            let destination_rows = match self.target.get_row_count(&table).await {
                Ok(count) => Some(count),
                Err(e) => {
                    debug!("{}: destination count unavailable: {}", table, e);
                    None
                }
            };

            let matches = destination_rows == Some(source_rows);
            if matches {
                info!("{}: {} rows (match)", table, source_rows);
            } else {
                warn!(
                    "{}: source={} destination={} (MISMATCH)",
                    table,
                    source_rows,
                    destination_rows.map_or_else(|| "missing".to_string(), |n| n.to_string())
                );
            }

            results.push(TableValidation {
                table,
                source_rows,
                destination_rows,
                matches,
            });
        }

        Ok(ValidationReport { tables: results })
    }

    /// Release both sessions. Close errors are logged only.
    async fn close(self) {
        if let Err(e) = self.source.close().await {
            warn!("Failed to close source connection: {}", e);
        }
        if let Err(e) = self.target.close().await {
            warn!("Failed to close destination connection: {}", e);
        }
        debug!("Connections closed");
    }
}

/// Where a failed run stopped.
fn failed_phase(state: &RunState) -> String {
    match state.tables_with_status(TaskStatus::Failed).first() {
        Some(table) => format!("migration of table {}", table),
        None => state.phase.to_string(),
    }
}

impl MigrationResult {
    fn from_state(state: &RunState, started_at: DateTime<Utc>, duration_seconds: f64) -> Self {
        let rows_migrated = state.rows_migrated();
        let rows_per_second = if duration_seconds > 0.0 {
            (rows_migrated as f64 / duration_seconds) as u64
        } else {
            0
        };
        let tables: Vec<TableSummary> = state
            .tables
            .iter()
            .map(|(name, t)| TableSummary {
                name: name.clone(),
                rows: t.rows_migrated,
                status: t.status,
            })
            .collect();

        Self {
            run_id: state.run_id.clone(),
            status: "completed".to_string(),
            duration_seconds,
            started_at,
            completed_at: state.completed_at.unwrap_or_else(Utc::now),
            tables_total: tables.len(),
            tables_success: state.tables_with_status(TaskStatus::Completed).len(),
            rows_migrated,
            rows_per_second,
            migration_order: state.order(),
            tables,
        }
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
