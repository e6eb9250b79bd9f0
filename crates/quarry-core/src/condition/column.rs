use crate::types::SqlType;
use crate::value::SqlValue;

use super::quote_identifier;

/// A column default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExpr {
    /// Raw SQL fragment placed after `DEFAULT`.
    Raw(String),
    /// Current timestamp, refreshed on update where the dialect supports it.
    CurrentTimestampOnUpdate,
}

/// One column of a descriptor: its DDL shape and, for data descriptors,
/// the value it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name, unquoted.
    pub name: String,
    /// SQL type.
    pub sql_type: SqlType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultExpr>,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Auto-incremented by the database.
    pub auto_increment: bool,
    /// Carries a UNIQUE constraint.
    pub unique: bool,
    /// Value for insert, update and upsert descriptors.
    pub value: Option<SqlValue>,
}

impl ColumnDefinition {
    /// Creates a NOT NULL column without default or value.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: false,
            default: None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            value: None,
        }
    }

    /// Returns the backtick-quoted column name.
    #[must_use]
    pub fn quoted_name(&self) -> String {
        quote_identifier(&self.name)
    }

    /// The carried value, NULL when none was set.
    #[must_use]
    pub fn bound_value(&self) -> SqlValue {
        self.value.clone().unwrap_or(SqlValue::Null)
    }
}
