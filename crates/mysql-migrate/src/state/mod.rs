//! In-memory run state for progress reporting.
//!
//! Nothing here is persisted: a failed run is recovered by resetting the
//! destination and running again from the first table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Inspecting,
    Sorting,
    ConstraintsDisabled,
    /// Index into the migration order.
    MigratingTable(usize),
    ConstraintsRestored,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Inspecting => write!(f, "inspecting"),
            RunPhase::Sorting => write!(f, "sorting"),
            RunPhase::ConstraintsDisabled => write!(f, "constraints disabled"),
            RunPhase::MigratingTable(i) => write!(f, "migrating table {}", i + 1),
            RunPhase::ConstraintsRestored => write!(f, "constraints restored"),
            RunPhase::Done => write!(f, "done"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Overall run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Per-table task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Per-table state.
#[derive(Debug, Clone, Serialize)]
pub struct TableState {
    pub status: TaskStatus,

    /// Source row count, fetched once when the table's data move starts.
    pub rows_total: u64,

    /// Rows written to the destination so far.
    pub rows_migrated: u64,

    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new()
    }
}

impl TableState {
    pub fn new() -> Self {
        Self {
            status: TaskStatus::Pending,
            rows_total: 0,
            rows_migrated: 0,
            error: None,
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
    }

    pub fn mark_failed(&mut self, error: &str) {
        self.status = TaskStatus::Failed;
        self.error = Some(error.to_string());
    }

    /// Percentage of rows migrated, 100 for an empty table.
    pub fn progress_percent(&self) -> f64 {
        if self.rows_total == 0 {
            return 100.0;
        }
        self.rows_migrated as f64 / self.rows_total as f64 * 100.0
    }
}

/// State of one migration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    /// Unique run identifier.
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    pub status: RunStatus,

    pub phase: RunPhase,

    /// Tables in migration order with their state.
    pub tables: Vec<(String, TableState)>,

    /// When the run reached a terminal phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunState {
    /// Create the state for a new run.
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            status: RunStatus::Running,
            phase: RunPhase::Inspecting,
            tables: Vec::new(),
            completed_at: None,
        }
    }

    /// Move to the next phase.
    pub fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
    }

    /// Register the migration order; every table starts pending.
    pub fn set_order(&mut self, order: &[String]) {
        self.tables = order
            .iter()
            .map(|name| (name.clone(), TableState::new()))
            .collect();
    }

    /// Migration order as registered.
    pub fn order(&self) -> Vec<String> {
        self.tables.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Mutable state of table `index` in migration order.
    pub fn table_mut(&mut self, index: usize) -> Option<&mut TableState> {
        self.tables.get_mut(index).map(|(_, state)| state)
    }

    /// Tables in a given status.
    pub fn tables_with_status(&self, status: TaskStatus) -> Vec<String> {
        self.tables
            .iter()
            .filter(|(_, state)| state.status == status)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Total rows written across all tables.
    pub fn rows_migrated(&self) -> u64 {
        self.tables
            .iter()
            .map(|(_, state)| state.rows_migrated)
            .sum()
    }

    /// Mark the run as completed.
    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Completed;
        self.phase = RunPhase::Done;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed.
    pub fn mark_failed(&mut self) {
        self.status = RunStatus::Failed;
        self.phase = RunPhase::Failed;
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_starts_inspecting() {
        let state = RunState::new("run-1".into());
        assert_eq!(state.phase, RunPhase::Inspecting);
        assert_eq!(state.status, RunStatus::Running);
        assert!(state.tables.is_empty());
        assert!(state.completed_at.is_none());
    }

    #[test]
    fn test_set_order_keeps_order() {
        let mut state = RunState::new("run-1".into());
        state.set_order(&["Users".to_string(), "Orders".to_string()]);
        assert_eq!(state.order(), vec!["Users", "Orders"]);
        assert_eq!(
            state.tables_with_status(TaskStatus::Pending),
            vec!["Users", "Orders"]
        );
    }

    #[test]
    fn test_table_progress() {
        let mut state = RunState::new("run-1".into());
        state.set_order(&["Users".to_string()]);
        let table = state.table_mut(0).unwrap();
        table.mark_in_progress();
        table.rows_total = 250;
        table.rows_migrated = 100;
        assert!((table.progress_percent() - 40.0).abs() < f64::EPSILON);
        table.rows_migrated = 250;
        table.mark_completed();

        assert_eq!(state.rows_migrated(), 250);
        assert_eq!(state.tables[0].1.status, TaskStatus::Completed);
    }

    #[test]
    fn test_empty_table_is_fully_migrated() {
        assert_eq!(TableState::new().progress_percent(), 100.0);
    }

    #[test]
    fn test_failure_records_error() {
        let mut state = RunState::new("run-1".into());
        state.set_order(&["Users".to_string()]);
        state.table_mut(0).unwrap().mark_failed("duplicate table");
        state.mark_failed();

        assert_eq!(state.phase, RunPhase::Failed);
        assert_eq!(state.tables_with_status(TaskStatus::Failed), ["Users"]);
        assert_eq!(state.tables[0].1.error.as_deref(), Some("duplicate table"));
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn test_phase_display() {
        let phase = RunPhase::MigratingTable(0);
        assert_eq!(phase.to_string(), "migrating table 1");
        let phase = RunPhase::ConstraintsDisabled;
        assert_eq!(phase.to_string(), "constraints disabled");
    }
}
