//! Error types for the migration library.

use thiserror::Error;

/// Which side of the migration a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection setup or liveness check failed.
    #[error("Connection to {side} database failed: {message}")]
    Connection { side: Side, message: String },

    /// Query against the source information schema failed.
    #[error("Inspection failed for {table}: {message}")]
    Inspection { table: String, message: String },

    /// Foreign-key graph contains a cycle.
    #[error("Circular dependency detected involving table {0}")]
    CycleDetected(String),

    /// Destination rejected the table definition.
    #[error("Failed to create table {table}: {message}")]
    SchemaCreation { table: String, message: String },

    /// Reading a page from the source failed.
    #[error("Failed to read data from table {table}: {message}")]
    DataRead { table: String, message: String },

    /// Writing rows to the destination failed.
    #[error("Failed to write data to table {table}: {message}")]
    DataWrite { table: String, message: String },

    /// Toggling FOREIGN_KEY_CHECKS on the destination failed.
    #[error("Failed to toggle foreign key checks: {0}")]
    ConstraintToggle(String),

    /// IO error (config and log files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process exit codes, one per error family.
pub const EXIT_CONFIG_ERROR: u8 = 1;
pub const EXIT_CONNECTION_ERROR: u8 = 2;
pub const EXIT_INSPECTION_ERROR: u8 = 3;
pub const EXIT_CYCLE_DETECTED: u8 = 4;
pub const EXIT_SCHEMA_ERROR: u8 = 5;
pub const EXIT_DATA_ERROR: u8 = 6;
pub const EXIT_IO_ERROR: u8 = 7;
pub const EXIT_CONSTRAINT_ERROR: u8 = 8;
/// `validate` found differing row counts; not produced by any error.
pub const EXIT_VALIDATION_MISMATCH: u8 = 9;

impl MigrateError {
    /// Create a Connection error for the given side.
    pub fn connection(side: Side, message: impl std::fmt::Display) -> Self {
        MigrateError::Connection {
            side,
            message: message.to_string(),
        }
    }

    /// Create an Inspection error with table context.
    pub fn inspection(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Inspection {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a SchemaCreation error with table context.
    pub fn schema_creation(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::SchemaCreation {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a DataRead error with table context.
    pub fn data_read(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::DataRead {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a DataWrite error with table context.
    pub fn data_write(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::DataWrite {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Table the error is attributed to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            MigrateError::Inspection { table, .. }
            | MigrateError::SchemaCreation { table, .. }
            | MigrateError::DataRead { table, .. }
            | MigrateError::DataWrite { table, .. } => Some(table),
            MigrateError::CycleDetected(table) => Some(table),
            _ => None,
        }
    }

    /// Exit code used by the CLI for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Inspection { .. } => EXIT_INSPECTION_ERROR,
            MigrateError::CycleDetected(_) => EXIT_CYCLE_DETECTED,
            MigrateError::SchemaCreation { .. } => EXIT_SCHEMA_ERROR,
            MigrateError::DataRead { .. } | MigrateError::DataWrite { .. } => EXIT_DATA_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::ConstraintToggle(_) => EXIT_CONSTRAINT_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
