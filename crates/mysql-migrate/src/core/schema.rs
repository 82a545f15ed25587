//! Schema metadata read from the source: columns and foreign keys.
//!
//! Table definitions themselves are never modelled; the source's native
//! `CREATE TABLE` text is replayed verbatim on the destination.

use serde::{Deserialize, Serialize};

/// Base types whose values are raw bytes.
const BINARY_TYPES: &[&str] = &[
    "binary",
    "varbinary",
    "blob",
    "tinyblob",
    "mediumblob",
    "longblob",
    "bit",
    "geometry",
    "point",
    "linestring",
    "polygon",
];

/// One row of `SHOW COLUMNS`, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Full column type, e.g. `varchar(256)` or `datetime(6)`.
    pub data_type: String,

    /// Whether the column accepts NULL.
    pub is_nullable: bool,

    /// Default expression, if any.
    pub default: Option<String>,

    /// Key role: `PRI`, `UNI`, `MUL` or empty.
    pub key: String,

    /// Extra attributes such as `auto_increment`.
    pub extra: String,
}

impl Column {
    /// Column with only a name and type; the rest defaulted.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
            key: String::new(),
            extra: String::new(),
        }
    }

    /// Base type without length or modifiers, lowercased.
    ///
    /// `varchar(256)` → `varchar`, `int unsigned` → `int`.
    pub fn base_type(&self) -> String {
        self.data_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Whether the column is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.key == "PRI"
    }

    /// Whether values of this column are raw bytes rather than text.
    pub fn is_binary(&self) -> bool {
        BINARY_TYPES.contains(&self.base_type().as_str())
    }
}

/// A single-column foreign-key reference from `owning.column` to
/// `referenced.referenced_column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Table that owns the constraint.
    pub table: String,

    /// Referencing column.
    pub column: String,

    /// Referenced table.
    pub ref_table: String,

    /// Referenced column.
    pub ref_column: String,
}

impl ForeignKey {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            ref_table: ref_table.into(),
            ref_column: ref_column.into(),
        }
    }

    /// Whether the key points back at its own table.
    pub fn is_self_reference(&self) -> bool {
        self.table == self.ref_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type() {
        assert_eq!(Column::new("Name", "varchar(256)").base_type(), "varchar");
        assert_eq!(Column::new("Id", "int unsigned").base_type(), "int");
        assert_eq!(Column::new("Blob", "LONGBLOB").base_type(), "longblob");
        assert_eq!(Column::new("At", "datetime(6)").base_type(), "datetime");
    }

    #[test]
    fn test_is_binary() {
        assert!(Column::new("Hash", "varbinary(32)").is_binary());
        assert!(Column::new("Avatar", "mediumblob").is_binary());
        assert!(!Column::new("Title", "text").is_binary());
        assert!(!Column::new("Birthday", "date").is_binary());
    }

    #[test]
    fn test_self_reference() {
        let fk = ForeignKey::new("Comments", "ParentId", "Comments", "Id");
        assert!(fk.is_self_reference());
        let fk = ForeignKey::new("Orders", "user_id", "Users", "id");
        assert!(!fk.is_self_reference());
    }
}
