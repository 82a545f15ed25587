//! Configuration validation.

use super::{Config, DatabaseConfig};
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_side("source", &config.source)?;
    validate_side("destination", &config.destination)?;

    // Replaying DDL into the source itself can only fail
    if config.source.host == config.destination.host
        && config.source.port == config.destination.port
        && config.source.database == config.destination.database
    {
        return Err(MigrateError::Config(
            "source and destination cannot be the same database".into(),
        ));
    }

    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config("migration.batch_size must be at least 1".into()));
    }
    if config.migration.connect_timeout_secs == 0 {
        return Err(MigrateError::Config(
            "migration.connect_timeout_secs must be at least 1".into(),
        ));
    }
    if config.migration.log_file.trim().is_empty() {
        return Err(MigrateError::Config("migration.log_file is required".into()));
    }

    for placeholder in &config.migration.zero_date_placeholders {
        if placeholder.table.is_empty() || placeholder.column.is_empty() {
            return Err(MigrateError::Config(
                "migration.zero_date_placeholders entries need both table and column".into(),
            ));
        }
    }

    Ok(())
}

fn validate_side(side: &str, db: &DatabaseConfig) -> Result<()> {
    if db.host.is_empty() {
        return Err(MigrateError::Config(format!("{}.host is required", side)));
    }
    if db.database.is_empty() {
        return Err(MigrateError::Config(format!("{}.database is required", side)));
    }
    if db.username.is_empty() {
        return Err(MigrateError::Config(format!("{}.username is required", side)));
    }
    Ok(())
}
