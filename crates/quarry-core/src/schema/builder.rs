use crate::condition::{quote_identifier, quote_table, ColumnDefinition, DefaultExpr};
use crate::error::Result;
use crate::value::{SqlValue, ToSqlValue};

use super::Schema;

/// Modifiers for the column most recently added to a [`Schema`].
///
/// Returned by every column-adding call, so a modifier always lands on the
/// column it follows.
#[derive(Debug)]
pub struct ColumnBuilder<'a> {
    schema: &'a mut Schema,
    index: usize,
}

impl<'a> ColumnBuilder<'a> {
    pub(crate) fn new(schema: &'a mut Schema, index: usize) -> Self {
        Self { schema, index }
    }

    fn column(&mut self) -> &mut ColumnDefinition {
        &mut self.schema.columns[self.index]
    }

    /// The column as built so far.
    #[must_use]
    pub fn definition(&self) -> &ColumnDefinition {
        &self.schema.columns[self.index]
    }

    /// Allows NULL.
    pub fn nullable(mut self) -> Self {
        self.column().nullable = true;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(self) -> Self {
        self.set_unique(true)
    }

    /// Sets or clears the UNIQUE constraint.
    pub fn set_unique(mut self, unique: bool) -> Self {
        self.column().unique = unique;
        self
    }

    /// Adds the column to the primary key.
    ///
    /// Auto-increment columns are already primary; marking one again is
    /// reported when the descriptor is compiled.
    pub fn primary(mut self) -> Self {
        if self.definition().auto_increment {
            let name = self.definition().name.clone();
            self.schema
                .push_error(format!("column `{name}` is auto-increment and already primary"));
            return self;
        }
        if !self.definition().primary_key {
            self.column().primary_key = true;
            let quoted = self.definition().quoted_name();
            self.schema.primary_keys.push(quoted);
        }
        self
    }

    /// Sets a raw SQL default, such as `0` or `'draft'`.
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.column().default = Some(DefaultExpr::Raw(expr.into()));
        self
    }

    /// Defaults to the current timestamp.
    pub fn default_current_timestamp(self) -> Self {
        self.default_value("CURRENT_TIMESTAMP")
    }

    /// References the same-named column of `table`, cascading deletes.
    pub fn foreign_key(self, table: &str) -> Self {
        let column = self.definition().name.clone();
        self.foreign_key_to(table, &column, true)
    }

    /// References `table(column)`.
    pub fn foreign_key_to(mut self, table: &str, column: &str, cascade: bool) -> Self {
        let name = self.definition().name.clone();
        if table.trim().is_empty() || column.trim().is_empty() {
            self.schema
                .push_error(format!("foreign key on `{name}` has an empty reference"));
            return self;
        }
        let mut fragment = format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            quote_identifier(&name),
            quote_table(table),
            quote_identifier(column)
        );
        if cascade {
            fragment.push_str(" ON DELETE CASCADE");
        }
        self.schema.foreign_keys.push(fragment);
        self
    }

    /// Sets the value the column carries.
    pub fn value(mut self, value: impl ToSqlValue) -> Self {
        self.column().value = Some(value.to_sql_value());
        self
    }

    /// Sets the value, recording a failed conversion against the descriptor.
    pub fn try_value(mut self, value: Result<SqlValue>) -> Self {
        match value {
            Ok(value) => self.column().value = Some(value),
            Err(e) => {
                let name = self.definition().name.clone();
                self.schema
                    .push_error(format!("value for column `{name}`: {e}"));
            }
        }
        self
    }
}
