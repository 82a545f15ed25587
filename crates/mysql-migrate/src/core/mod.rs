//! Core abstractions for the migration engine.
//!
//! - [`schema`]: column and foreign-key metadata
//! - [`value`]: tagged cell values and row batches
//! - [`dependency`]: foreign-key graph and migration ordering
//! - [`traits`]: reader/writer seams implemented by the drivers
//!
//! Nothing in this module talks to a database, so the ordering and transfer
//! logic built on it can run against in-memory readers and writers.

pub mod dependency;
pub mod schema;
pub mod traits;
pub mod value;

pub use dependency::{sort_tables_by_dependencies, DependencyGraph};
pub use schema::{Column, ForeignKey};
pub use traits::{SourceReader, TargetWriter};
pub use value::{Batch, Row, SqlValue};
