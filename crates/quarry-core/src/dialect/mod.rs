//! Dialect strategies.
//!
//! Everything that differs between MySQL, MariaDB and SQLite sits behind
//! [`Dialect`]: auto-increment rendering, the upsert clause, timestamp
//! defaults, column modification and live-column introspection. The
//! compiler asks the dialect it is handed; nothing reads a global.

mod mysql;
mod sqlite;

pub use mysql::{MariaDbDialect, MySqlDialect};
pub use sqlite::SqliteDialect;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compile::Statement;
use crate::condition::{ColumnDefinition, DefaultExpr};
use crate::error::{Error, Result};
use crate::types::SqlType;

/// Supported database products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// MySQL.
    MySql,
    /// MariaDB.
    MariaDb,
    /// SQLite.
    Sqlite,
}

static MYSQL: MySqlDialect = MySqlDialect::new();
static MARIADB: MariaDbDialect = MariaDbDialect::new();
static SQLITE: SqliteDialect = SqliteDialect::new();

impl DialectKind {
    /// Returns the strategy for this product.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::MySql => &MYSQL,
            Self::MariaDb => &MARIADB,
            Self::Sqlite => &SQLITE,
        }
    }

    /// Returns true for the client/server products.
    #[must_use]
    pub const fn is_server(self) -> bool {
        matches!(self, Self::MySql | Self::MariaDb)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Sqlite => "sqlite",
        })
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "mariadb" => Ok(Self::MariaDb),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(Error::UnknownDialect(s.to_string())),
        }
    }
}

/// How the migration manager discovers which columns a table already has.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnProbe {
    /// One query returning a row per live column, with the name in `name`.
    TableInfo(Statement),
    /// `COUNT(*)` queries: `table` is zero when the table does not exist,
    /// each entry of `columns` is zero when that column is missing.
    PerColumn {
        table: Statement,
        columns: Vec<(String, Statement)>,
    },
}

/// Dialect-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Returns the dialect kind.
    fn kind(&self) -> DialectKind;

    /// Returns the product name.
    fn name(&self) -> &'static str;

    /// Renders a column default.
    fn default_sql(&self, default: &DefaultExpr) -> String;

    /// Renders a column type.
    fn type_sql(&self, sql_type: SqlType) -> String {
        sql_type.to_string()
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &ColumnDefinition) -> String {
        server_column_definition(self, column)
    }

    /// Whether the column carries its own `PRIMARY KEY`, so the table-level
    /// clause must be left out.
    fn inlines_primary_key(&self, _column: &ColumnDefinition) -> bool {
        false
    }

    /// Renders the clause appended to a multi-row insert so that key
    /// conflicts update `update_columns` instead of failing.
    ///
    /// Both lists hold quoted column names.
    ///
    /// # Errors
    ///
    /// Returns an error when the dialect needs a conflict target and none
    /// was given.
    fn upsert_clause(
        &self,
        table: &str,
        conflict_columns: &[String],
        update_columns: &[String],
    ) -> Result<String>;

    /// Renders a statement redefining `column` of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] where the product cannot modify columns.
    fn modify_column(&self, table: &str, column: &ColumnDefinition) -> Result<String>;

    /// Builds the queries that list the live columns of `table`.
    fn column_probe(
        &self,
        table: &str,
        database: Option<&str>,
        columns: &[ColumnDefinition],
    ) -> ColumnProbe;
}

/// Column rendering shared by all dialects:
/// `` `name` TYPE [AUTO_INCREMENT] NULL|NOT NULL [DEFAULT x] [UNIQUE] ``.
pub(crate) fn server_column_definition<D: Dialect + ?Sized>(
    dialect: &D,
    column: &ColumnDefinition,
) -> String {
    let mut sql = format!("{} {}", column.quoted_name(), dialect.type_sql(column.sql_type));
    if column.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&dialect.default_sql(default));
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}
