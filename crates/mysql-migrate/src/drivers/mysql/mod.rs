//! MySQL/MariaDB database driver.
//!
//! - [`MysqlReader`]: source inspection and paged reads
//! - [`MysqlWriter`]: destination DDL replay, inserts and the
//!   foreign-key-check toggle
//!
//! Both sides use `mysql_async` over a single connection each. Rows are
//! read with prepared statements so temporal values keep their binary form.
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod connection;
mod convert;
pub mod dialect;
mod reader;
mod writer;

pub use connection::{connect, probe, ConnectionProbe};
pub use convert::{from_mysql, to_mysql};
pub use reader::MysqlReader;
pub use writer::MysqlWriter;
