use crate::compile::Statement;
use crate::condition::{quote_table, ColumnDefinition, DefaultExpr};
use crate::error::{Error, Result};
use crate::types::SqlType;

use super::{server_column_definition, ColumnProbe, Dialect, DialectKind};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn default_sql(&self, default: &DefaultExpr) -> String {
        match default {
            DefaultExpr::Raw(expr) => expr.clone(),
            // No ON UPDATE clause in SQLite.
            DefaultExpr::CurrentTimestampOnUpdate => String::from("CURRENT_TIMESTAMP"),
        }
    }

    fn type_sql(&self, sql_type: SqlType) -> String {
        match sql_type {
            // NUMERIC affinity would round decimals to a 64-bit float.
            SqlType::Decimal(..) => String::from("TEXT"),
            other => other.to_string(),
        }
    }

    fn column_definition(&self, column: &ColumnDefinition) -> String {
        if self.inlines_primary_key(column) {
            // AUTOINCREMENT is only accepted on an INTEGER PRIMARY KEY.
            let mut sql = format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", column.quoted_name());
            if column.unique {
                sql.push_str(" UNIQUE");
            }
            return sql;
        }
        server_column_definition(self, column)
    }

    fn inlines_primary_key(&self, column: &ColumnDefinition) -> bool {
        column.auto_increment
    }

    fn upsert_clause(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: &[String],
    ) -> Result<String> {
        if conflict_columns.is_empty() {
            return Err(Error::invalid(
                table,
                "upsert needs a primary-key or unique column as conflict target",
            ));
        }
        if update_columns.is_empty() {
            return Ok(format!(
                " ON CONFLICT ({}) DO NOTHING",
                conflict_columns.join(", ")
            ));
        }
        let assignments = update_columns
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            " ON CONFLICT ({}) DO UPDATE SET {assignments}",
            conflict_columns.join(", ")
        ))
    }

    fn modify_column(&self, _table: &str, _column: &ColumnDefinition) -> Result<String> {
        Err(Error::Unsupported {
            dialect: self.name(),
            operation: "modifying columns",
        })
    }

    fn column_probe(
        &self,
        table: &str,
        _database: Option<&str>,
        _columns: &[ColumnDefinition],
    ) -> ColumnProbe {
        ColumnProbe::TableInfo(Statement::new(
            format!("PRAGMA table_info({})", quote_table(table)),
            Vec::new(),
        ))
    }
}
