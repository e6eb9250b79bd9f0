//! Mapping between Rust types and descriptors or result rows.
//!
//! [`FieldType`] ties a Rust type to an inferred column type and to the
//! conversions in both directions. [`Record`] describes a whole struct and
//! is normally derived:
//!
//! ```ignore
//! #[derive(Record)]
//! struct User {
//!     #[column(auto_increment)]
//!     id: Option<i64>,
//!     #[column(sql_type = "varchar(50)", unique)]
//!     name: String,
//!     age: i64,
//! }
//! ```

mod fields;

use std::sync::Arc;

use crate::blob::AllowList;
use crate::error::{Error, Result};
use crate::schema::{ColumnBuilder, Schema, SchemaKind};
use crate::value::SqlValue;

/// Context for a single column conversion.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Column being converted.
    pub column: &'a str,
    /// Blob types the row may deserialize.
    pub allow_list: &'a AllowList,
}

impl FieldContext<'_> {
    /// Builds a conversion error for this column.
    #[must_use]
    pub fn conversion(&self, message: impl Into<String>) -> Error {
        Error::conversion(self.column, message)
    }

    /// Rejects NULL for non-optional fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedNull`] when `value` is NULL.
    pub fn present(&self, value: SqlValue) -> Result<SqlValue> {
        match value {
            SqlValue::Null => Err(Error::UnexpectedNull(self.column.to_string())),
            value => Ok(value),
        }
    }
}

/// A Rust type that maps onto a single column.
pub trait FieldType: Sized {
    /// Whether the inferred column accepts NULL.
    const NULLABLE: bool = false;

    /// Declares the column with the type inferred for `Self`.
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s>;

    /// Converts a field value into a bindable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded.
    fn to_sql(&self) -> Result<SqlValue>;

    /// Converts a column value back into the field type.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is NULL for a non-optional field or
    /// cannot be converted.
    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self>;
}

/// A struct that maps onto a table.
pub trait Record: Sized {
    /// Declares one column per field. With an instance, each column also
    /// carries the field's value.
    fn describe(schema: &mut Schema, instance: Option<&Self>);

    /// Rebuilds the struct from a result row.
    ///
    /// # Errors
    ///
    /// Returns an error when a column is missing, NULL for a non-optional
    /// field, or of an unconvertible type.
    fn from_row(row: &Row) -> Result<Self>;

    /// Names of the primary-key and auto-increment columns.
    #[must_use]
    fn key_columns() -> Vec<String> {
        let mut schema = Schema::new("", SchemaKind::Create);
        Self::describe(&mut schema, None);
        schema
            .columns()
            .iter()
            .filter(|c| c.primary_key || c.auto_increment)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// A result row: column names with their values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
    allow_list: Arc<AllowList>,
}

impl Row {
    /// Creates a row.
    #[must_use]
    pub fn new(columns: Vec<(String, SqlValue)>, allow_list: Arc<AllowList>) -> Self {
        Self {
            columns,
            allow_list,
        }
    }

    /// Returns the raw value of `column`.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, value)| value)
    }

    /// Converts `column` to `T`. A missing column reads as NULL.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of `T`.
    pub fn get<T: FieldType>(&self, column: &str) -> Result<T> {
        let value = self.value(column).cloned().unwrap_or(SqlValue::Null);
        T::from_sql(
            value,
            &FieldContext {
                column,
                allow_list: &self.allow_list,
            },
        )
    }

    /// Column names in select order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true for a row without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Consumes the row into its column/value pairs.
    #[must_use]
    pub fn into_values(self) -> Vec<(String, SqlValue)> {
        self.columns
    }
}

/// Implements [`FieldType`] for a type through its `Display` and `FromStr`
/// forms, stored in a `VARCHAR` column. Meant for field-less enums.
///
/// ```
/// use std::fmt;
/// use std::str::FromStr;
///
/// #[derive(Debug, PartialEq)]
/// enum Status { Active, Banned }
///
/// impl fmt::Display for Status {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(match self { Self::Active => "ACTIVE", Self::Banned => "BANNED" })
///     }
/// }
///
/// impl FromStr for Status {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, String> {
///         match s {
///             "ACTIVE" => Ok(Self::Active),
///             "BANNED" => Ok(Self::Banned),
///             other => Err(other.to_string()),
///         }
///     }
/// }
///
/// quarry_core::text_enum!(Status, 16);
/// ```
#[macro_export]
macro_rules! text_enum {
    ($ty:ty) => {
        $crate::text_enum!($ty, 255);
    };
    ($ty:ty, $len:expr) => {
        impl $crate::FieldType for $ty {
            fn declare<'s>(
                schema: &'s mut $crate::Schema,
                column: &str,
            ) -> $crate::ColumnBuilder<'s> {
                schema.string(column, $len)
            }

            fn to_sql(&self) -> $crate::Result<$crate::SqlValue> {
                ::core::result::Result::Ok($crate::SqlValue::Text(self.to_string()))
            }

            fn from_sql(
                value: $crate::SqlValue,
                ctx: &$crate::FieldContext<'_>,
            ) -> $crate::Result<Self> {
                let text = <::std::string::String as $crate::FieldType>::from_sql(value, ctx)?;
                text.parse::<$ty>()
                    .map_err(|e| ctx.conversion(format!("`{text}` is not a valid variant: {e}")))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: Vec<(&str, SqlValue)>) -> Row {
        Row::new(
            columns
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            Arc::new(AllowList::default()),
        )
    }

    #[test]
    fn test_get_converts() {
        let row = row(vec![
            ("id", SqlValue::Int(3)),
            ("name", SqlValue::Text(String::from("ann"))),
        ]);
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("name").unwrap(), "ann");
    }

    #[test]
    fn test_missing_column_is_null() {
        let row = row(vec![]);
        assert_eq!(row.get::<Option<i64>>("id").unwrap(), None);
        assert!(matches!(
            row.get::<i64>("id"),
            Err(Error::UnexpectedNull(column)) if column == "id"
        ));
    }

    #[test]
    fn test_lookup_falls_back_to_case_insensitive() {
        let row = row(vec![("COUNT", SqlValue::Int(1))]);
        assert_eq!(row.get::<i64>("count").unwrap(), 1);
    }
}
