//! Connection configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::blob::AllowList;
use crate::dialect::{Dialect, DialectKind};

/// Placeholder replaced by [`DatabaseConfig::table_prefix`] in final SQL.
pub const PREFIX_PLACEHOLDER: &str = "%prefix%";

/// Settings for one database connection pool.
///
/// Deserializes from any serde format; missing fields take the defaults of
/// an in-memory SQLite database.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database product.
    pub dialect: DialectKind,
    /// Substituted for `%prefix%` in every statement.
    pub table_prefix: String,
    /// Log every statement before it runs.
    pub debug: bool,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Server user.
    pub user: String,
    /// Server password.
    pub password: String,
    /// Server database name.
    pub database: Option<String>,
    /// SQLite database file. `None` means in-memory.
    pub path: Option<PathBuf>,
    /// Upper bound of pooled connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_secs: u64,
    /// Blob types rows may deserialize.
    pub allow_list: AllowList,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Sqlite,
            table_prefix: String::new(),
            debug: false,
            host: String::from("localhost"),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: None,
            path: None,
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            allow_list: AllowList::default(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("dialect", &self.dialect)
            .field("table_prefix", &self.table_prefix)
            .field("debug", &self.debug)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("path", &self.path)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl DatabaseConfig {
    fn server(
        dialect: DialectKind,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
    ) -> Self {
        Self {
            dialect,
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: password.to_string(),
            database: Some(database.to_string()),
            ..Self::default()
        }
    }

    /// MySQL server settings.
    #[must_use]
    pub fn mysql(host: &str, port: u16, user: &str, password: &str, database: &str) -> Self {
        Self::server(DialectKind::MySql, host, port, user, password, database)
    }

    /// MariaDB server settings.
    #[must_use]
    pub fn mariadb(host: &str, port: u16, user: &str, password: &str, database: &str) -> Self {
        Self::server(DialectKind::MariaDb, host, port, user, password, database)
    }

    /// SQLite file, created if missing.
    #[must_use]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Private in-memory SQLite database.
    #[must_use]
    pub fn sqlite_memory() -> Self {
        Self::default()
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = prefix.to_string();
        self
    }

    /// Enables statement logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets pool bounds.
    #[must_use]
    pub const fn with_pool(mut self, max_connections: u32, min_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = min_connections;
        self
    }

    /// Sets the blob allow-list.
    #[must_use]
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Returns the dialect strategy.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect.dialect()
    }

    /// Connection URL without the password, for logs and diagnostics.
    #[must_use]
    pub fn connection_url(&self) -> String {
        match (self.dialect, &self.path) {
            (DialectKind::Sqlite, Some(path)) => format!("sqlite://{}", path.display()),
            (DialectKind::Sqlite, None) => "sqlite::memory:".to_string(),
            (DialectKind::MySql | DialectKind::MariaDb, _) => format!(
                "mysql://{}@{}:{}/{}",
                self.user,
                self.host,
                self.port,
                self.database.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Replaces every `%prefix%` in `sql` with the table prefix.
    #[must_use]
    pub fn replace_prefix(&self, sql: &str) -> String {
        sql.replace(PREFIX_PLACEHOLDER, &self.table_prefix)
    }
}
