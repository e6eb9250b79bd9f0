use crate::compile::Statement;
use crate::condition::{quote_table, ColumnDefinition, DefaultExpr};
use crate::error::{Error, Result};
use crate::value::SqlValue;

use super::{ColumnProbe, Dialect, DialectKind};

/// MySQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// MariaDB dialect. Renders the same SQL as MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MariaDbDialect;

impl MariaDbDialect {
    /// Creates a new MariaDB dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn default_sql(default: &DefaultExpr) -> String {
    match default {
        DefaultExpr::Raw(expr) => expr.clone(),
        DefaultExpr::CurrentTimestampOnUpdate => {
            String::from("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")
        }
    }
}

fn upsert_clause(table: &str, update_columns: &[String]) -> Result<String> {
    if update_columns.is_empty() {
        return Err(Error::invalid(table, "upsert has no columns to update"));
    }
    let assignments = update_columns
        .iter()
        .map(|c| format!("{c} = VALUES({c})"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(" ON DUPLICATE KEY UPDATE {assignments}"))
}

fn modify_column<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    column: &ColumnDefinition,
) -> String {
    format!(
        "ALTER TABLE {} MODIFY COLUMN {}",
        quote_table(table),
        dialect.column_definition(column)
    )
}

/// `information_schema` counts for the table and each declared column.
///
/// Without a configured database the connection's current schema is used.
fn column_probe(table: &str, database: Option<&str>, columns: &[ColumnDefinition]) -> ColumnProbe {
    let count = |view: &str, column: Option<&str>| {
        let mut params = vec![SqlValue::Text(table.to_string())];
        let schema = match database {
            Some(database) => {
                params.push(SqlValue::Text(database.to_string()));
                "?"
            }
            None => "DATABASE()",
        };
        let mut sql = format!(
            "SELECT COUNT(*) FROM `information_schema`.`{view}` \
             WHERE `TABLE_NAME` = ? AND `TABLE_SCHEMA` = {schema}"
        );
        if let Some(column) = column {
            sql.push_str(" AND `COLUMN_NAME` = ?");
            params.push(SqlValue::Text(column.to_string()));
        }
        Statement::new(sql, params)
    };
    ColumnProbe::PerColumn {
        table: count("TABLES", None),
        columns: columns
            .iter()
            .map(|c| (c.name.clone(), count("COLUMNS", Some(c.name.as_str()))))
            .collect(),
    }
}

macro_rules! server_dialect {
    ($ty:ty, $kind:expr, $name:literal) => {
        impl Dialect for $ty {
            fn kind(&self) -> DialectKind {
                $kind
            }

            fn name(&self) -> &'static str {
                $name
            }

            fn default_sql(&self, default: &DefaultExpr) -> String {
                default_sql(default)
            }

            fn upsert_clause(
                &self,
                table: &str,
                _conflict_columns: &[String],
                update_columns: &[String],
            ) -> Result<String> {
                upsert_clause(table, update_columns)
            }

            fn modify_column(&self, table: &str, column: &ColumnDefinition) -> Result<String> {
                Ok(modify_column(self, table, column))
            }

            fn column_probe(
                &self,
                table: &str,
                database: Option<&str>,
                columns: &[ColumnDefinition],
            ) -> ColumnProbe {
                column_probe(table, database, columns)
            }
        }
    };
}

server_dialect!(MySqlDialect, DialectKind::MySql, "MySQL");
server_dialect!(MariaDbDialect, DialectKind::MariaDb, "MariaDB");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    #[test]
    fn test_auto_increment_column() {
        let mut column = ColumnDefinition::new("id", SqlType::BigInt);
        column.auto_increment = true;
        column.primary_key = true;
        assert_eq!(
            MySqlDialect::new().column_definition(&column),
            "`id` BIGINT AUTO_INCREMENT NOT NULL"
        );
    }

    #[test]
    fn test_updated_at_refreshes_on_update() {
        let mut column = ColumnDefinition::new("updated_at", SqlType::Timestamp);
        column.default = Some(DefaultExpr::CurrentTimestampOnUpdate);
        assert_eq!(
            MariaDbDialect::new().column_definition(&column),
            "`updated_at` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_upsert_clause() {
        let clause = MySqlDialect::new()
            .upsert_clause("users", &[], &[String::from("`email`")])
            .unwrap();
        assert_eq!(clause, " ON DUPLICATE KEY UPDATE `email` = VALUES(`email`)");
    }

    #[test]
    fn test_modify_column() {
        let column = ColumnDefinition::new("name", SqlType::Varchar(100));
        assert_eq!(
            MySqlDialect::new().modify_column("users", &column).unwrap(),
            "ALTER TABLE `users` MODIFY COLUMN `name` VARCHAR(100) NOT NULL"
        );
    }

    #[test]
    fn test_probe_counts_table_and_each_column() {
        let columns = [ColumnDefinition::new("email", SqlType::Varchar(255))];
        let ColumnProbe::PerColumn { table, columns } =
            MySqlDialect::new().column_probe("users", Some("app"), &columns)
        else {
            panic!("expected per-column probe");
        };
        assert_eq!(
            table.sql,
            "SELECT COUNT(*) FROM `information_schema`.`TABLES` \
             WHERE `TABLE_NAME` = ? AND `TABLE_SCHEMA` = ?"
        );
        assert_eq!(
            table.params,
            vec![SqlValue::Text(String::from("users")), SqlValue::Text(String::from("app"))]
        );
        let (name, statement) = &columns[0];
        assert_eq!(name, "email");
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM `information_schema`.`COLUMNS` \
             WHERE `TABLE_NAME` = ? AND `TABLE_SCHEMA` = ? AND `COLUMN_NAME` = ?"
        );
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Text(String::from("users")),
                SqlValue::Text(String::from("app")),
                SqlValue::Text(String::from("email")),
            ]
        );
    }

    #[test]
    fn test_probe_without_database_uses_current_schema() {
        let columns = [ColumnDefinition::new("c", SqlType::Varchar(10))];
        let ColumnProbe::PerColumn { table, columns } =
            MariaDbDialect::new().column_probe("t", None, &columns)
        else {
            panic!("expected per-column probe");
        };
        assert!(table.sql.ends_with("`TABLE_SCHEMA` = DATABASE()"));
        assert_eq!(table.params, vec![SqlValue::Text(String::from("t"))]);
        assert!(columns[0]
            .1
            .sql
            .ends_with("`TABLE_SCHEMA` = DATABASE() AND `COLUMN_NAME` = ?"));
        assert_eq!(
            columns[0].1.params,
            vec![SqlValue::Text(String::from("t")), SqlValue::Text(String::from("c"))]
        );
    }
}
