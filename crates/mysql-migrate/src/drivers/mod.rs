//! Database driver implementations.
//!
//! Each driver module implements the core traits:
//! - `SourceReader`: for reading schema and data from the database
//! - `TargetWriter`: for writing schema and data to the database
//!
//! Only MySQL-compatible engines are supported on either side; DDL read
//! from the source is replayed on the destination without translation.

pub mod mysql;

pub use mysql::{MysqlReader, MysqlWriter};
