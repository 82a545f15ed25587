//! In-memory source and destination used by unit tests.
//!
//! Both fakes are cheap handles over shared state, so a test can keep a
//! clone to inspect after the orchestrator has consumed and closed its own.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::core::schema::{Column, ForeignKey};
use crate::core::traits::{SourceReader, TargetWriter};
use crate::core::value::{Batch, Row};
use crate::error::{MigrateError, Result};

/// A source table with its rows.
#[derive(Debug, Clone)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    pub rows: Vec<Row>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    pub fn references(mut self, column: &str, ref_table: &str, ref_column: &str) -> Self {
        self.foreign_keys
            .push(ForeignKey::new(&self.name, column, ref_table, ref_column));
        self
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    fn definition(&self) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("`{}` {}", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE `{}` ({})", self.name, cols)
    }
}

#[derive(Default)]
struct SourceInner {
    tables: Vec<FakeTable>,
    reads: Vec<(String, u64, u64, usize)>,
    fail_read: Option<(String, u64)>,
    fail_inspection: Option<String>,
    closed: bool,
}

/// In-memory [`SourceReader`].
#[derive(Clone, Default)]
pub struct FakeSource {
    inner: Arc<Mutex<SourceInner>>,
}

impl FakeSource {
    /// Tables are enumerated in the given order.
    pub fn new(tables: Vec<FakeTable>) -> Self {
        let source = Self::default();
        source.lock().tables = tables;
        source
    }

    /// Fail the page read of `table` at `offset`.
    pub fn fail_read_at(self, table: &str, offset: u64) -> Self {
        self.lock().fail_read = Some((table.to_string(), offset));
        self
    }

    /// Fail foreign key inspection of `table`.
    pub fn fail_inspection_of(self, table: &str) -> Self {
        self.lock().fail_inspection = Some(table.to_string());
        self
    }

    pub fn columns_of(&self, table: &str) -> Vec<Column> {
        self.lock()
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.clone())
            .unwrap_or_default()
    }

    /// `(limit, offset)` of every page read, in order.
    pub fn page_reads(&self) -> Vec<(u64, u64)> {
        self.lock()
            .reads
            .iter()
            .map(|(_, limit, offset, _)| (*limit, *offset))
            .collect()
    }

    /// Rows returned by every page read, in order.
    pub fn page_sizes(&self) -> Vec<usize> {
        self.lock().reads.iter().map(|(_, _, _, n)| *n).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, SourceInner> {
        self.inner.lock().unwrap()
    }

    fn table(&self, name: &str) -> Result<FakeTable> {
        self.lock()
            .tables
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| MigrateError::inspection(name, "table doesn't exist"))
    }
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn list_tables(&mut self, skip: &HashSet<String>) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .tables
            .iter()
            .map(|t| t.name.clone())
            .filter(|name| !skip.contains(name))
            .collect())
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<Column>> {
        Ok(self.table(table)?.columns)
    }

    async fn get_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        if self.lock().fail_inspection.as_deref() == Some(table) {
            return Err(MigrateError::inspection(table, "access denied"));
        }
        Ok(self.table(table)?.foreign_keys)
    }

    async fn get_schema_definition(&mut self, table: &str) -> Result<String> {
        Ok(self.table(table)?.definition())
    }

    async fn get_row_count(&mut self, table: &str) -> Result<u64> {
        Ok(self.table(table)?.rows.len() as u64)
    }

    async fn read_page(
        &mut self,
        table: &str,
        _columns: &[Column],
        limit: u64,
        offset: u64,
    ) -> Result<Batch> {
        let fail = self.lock().fail_read.clone();
        if let Some((t, at)) = fail {
            if t == table && at == offset {
                return Err(MigrateError::data_read(table, "lost connection"));
            }
        }

        let rows: Vec<Row> = self
            .table(table)?
            .rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        self.lock()
            .reads
            .push((table.to_string(), limit, offset, rows.len()));
        Ok(Batch::new(rows))
    }

    async fn close(self) -> Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}

#[derive(Default)]
struct TargetInner {
    created: Vec<String>,
    rows: HashMap<String, Vec<Row>>,
    events: Vec<String>,
    prepared: usize,
    write_calls: usize,
    table_writes: HashMap<String, usize>,
    closed_statements: usize,
    disable_calls: usize,
    enable_calls: usize,
    fail_write: Option<(String, usize)>,
    fail_disable: bool,
    fail_enable: bool,
    closed: bool,
}

/// In-memory [`TargetWriter`] that records every call.
#[derive(Clone, Default)]
pub struct FakeTarget {
    inner: Arc<Mutex<TargetInner>>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `table` already exists on the destination.
    pub fn with_existing(self, table: &str) -> Self {
        {
            let mut inner = self.lock();
            inner.created.push(table.to_string());
            inner.rows.insert(table.to_string(), Vec::new());
        }
        self
    }

    /// Fail the `nth` (1-based) write into `table`.
    pub fn fail_write_on(self, table: &str, nth: usize) -> Self {
        self.lock().fail_write = Some((table.to_string(), nth));
        self
    }

    pub fn fail_disable(self) -> Self {
        self.lock().fail_disable = true;
        self
    }

    pub fn fail_enable(self) -> Self {
        self.lock().fail_enable = true;
        self
    }

    pub fn rows_of(&self, table: &str) -> Vec<Row> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    /// Tables created, in creation order.
    pub fn created(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    /// Every mutating call, in order.
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    pub fn prepared(&self) -> usize {
        self.lock().prepared
    }

    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    pub fn closed_statements(&self) -> usize {
        self.lock().closed_statements
    }

    pub fn disable_calls(&self) -> usize {
        self.lock().disable_calls
    }

    pub fn enable_calls(&self) -> usize {
        self.lock().enable_calls
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, TargetInner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl TargetWriter for FakeTarget {
    type Statement = String;

    async fn create_table(&mut self, table: &str, _definition: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.created.iter().any(|t| t == table) {
            return Err(MigrateError::schema_creation(
                table,
                format!("Table '{}' already exists", table),
            ));
        }
        inner.created.push(table.to_string());
        inner.rows.insert(table.to_string(), Vec::new());
        inner.events.push(format!("create {}", table));
        Ok(())
    }

    async fn prepare_insert(&mut self, table: &str, _columns: &[Column]) -> Result<String> {
        let mut inner = self.lock();
        inner.prepared += 1;
        inner.events.push(format!("prepare {}", table));
        Ok(table.to_string())
    }

    async fn write_rows(&mut self, table: &str, stmt: &String, rows: Vec<Row>) -> Result<u64> {
        assert_eq!(stmt, table, "statement prepared for another table");
        let mut inner = self.lock();
        inner.write_calls += 1;
        let writes = inner.table_writes.entry(table.to_string()).or_default();
        *writes += 1;
        let nth = *writes;
        if let Some((t, fail_at)) = &inner.fail_write {
            if t == table && *fail_at == nth {
                return Err(MigrateError::data_write(table, "Incorrect date value"));
            }
        }
        let count = rows.len() as u64;
        inner.rows.entry(table.into()).or_default().extend(rows);
        Ok(count)
    }

    async fn close_statement(&mut self, table: &str, _statement: String) -> Result<()> {
        let mut inner = self.lock();
        inner.closed_statements += 1;
        inner.events.push(format!("close {}", table));
        Ok(())
    }

    async fn disable_foreign_key_checks(&mut self) -> Result<()> {
        let mut inner = self.lock();
        inner.disable_calls += 1;
        if inner.fail_disable {
            return Err(MigrateError::ConstraintToggle("disable: access denied".into()));
        }
        inner.events.push("disable".into());
        Ok(())
    }

    async fn enable_foreign_key_checks(&mut self) -> Result<()> {
        let mut inner = self.lock();
        inner.enable_calls += 1;
        if inner.fail_enable {
            return Err(MigrateError::ConstraintToggle("enable: server has gone away".into()));
        }
        inner.events.push("enable".into());
        Ok(())
    }

    async fn get_row_count(&mut self, table: &str) -> Result<u64> {
        self.lock()
            .rows
            .get(table)
            .map(|rows| rows.len() as u64)
            .ok_or_else(|| MigrateError::inspection(table, "table doesn't exist"))
    }

    async fn close(self) -> Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// Records the message of every tracing event while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    /// Make this the current thread's subscriber until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured messages containing `needle`, in emission order.
    pub fn containing(&self, needle: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.lines.lock().unwrap().push(visitor.0);
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        }
    }
}
