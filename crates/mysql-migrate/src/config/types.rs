//! Configuration type definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the tables are read from.
    pub source: DatabaseConfig,

    /// Database the tables are created in and written to.
    pub destination: DatabaseConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Connection settings for one side of the migration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Username.
    pub username: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database name.
    pub database: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseConfig {
    /// `host:port/database`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per page read from the source.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Tables excluded from the run (exact names).
    #[serde(default)]
    pub skip_tables: Vec<String>,

    /// Append-only log file.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Upper bound on connection setup, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Replacement dates for zero dates in specific columns.
    /// Zero dates in any column not listed here become NULL.
    #[serde(default = "default_zero_date_placeholders")]
    pub zero_date_placeholders: Vec<ZeroDatePlaceholder>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            skip_tables: Vec::new(),
            log_file: default_log_file(),
            connect_timeout_secs: default_connect_timeout_secs(),
            zero_date_placeholders: default_zero_date_placeholders(),
        }
    }
}

impl MigrationConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// A table+column pair whose zero dates map to a fixed date instead of NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroDatePlaceholder {
    pub table: String,
    pub column: String,
    pub value: NaiveDate,
}

// Default value functions for serde
fn default_mysql_port() -> u16 {
    3306
}

fn default_batch_size() -> usize {
    1000
}

fn default_log_file() -> String {
    "migration.log".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_zero_date_placeholders() -> Vec<ZeroDatePlaceholder> {
    vec![ZeroDatePlaceholder {
        table: "AspNetUsers".to_string(),
        column: "Birthday".to_string(),
        value: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
    }]
}
