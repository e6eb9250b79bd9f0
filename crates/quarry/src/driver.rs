//! The sqlx connection collaborator.
//!
//! [`Pool`] wraps one sqlx pool per backend. MySQL and MariaDB share the
//! MySQL driver. Parameters are bound from [`SqlValue`]s and result rows are
//! decoded back into them, so nothing above this module sees sqlx types.

use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_core::value::TIMESTAMP_FORMAT;
use quarry_core::{DatabaseConfig, DialectKind, SqlValue};
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Connection as _, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

type DriverResult<T> = std::result::Result<T, sqlx::Error>;

/// Column name and value pairs of one result row, in select order.
pub(crate) type RawRow = Vec<(String, SqlValue)>;

/// What a single statement did.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QueryOutcome {
    pub rows_affected: u64,
    /// Generated key of the last inserted row, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// A connection pool for one of the supported backends.
#[derive(Debug, Clone)]
pub enum Pool {
    /// MySQL or MariaDB.
    MySql(MySqlPool),
    /// SQLite, file-backed or in memory.
    Sqlite(SqlitePool),
}

impl Pool {
    /// Opens a pool for the configured dialect.
    ///
    /// File-backed SQLite databases get their parent directories created.
    /// An in-memory SQLite database is held by a single connection that is
    /// never recycled, so its contents live as long as the pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when the SQLite directory cannot be created and
    /// [`crate::Error::Database`] when the pool cannot connect.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.connection_url(), dialect = %config.dialect, "Connecting to database");
        let pool = match config.dialect {
            DialectKind::Sqlite => Self::Sqlite(connect_sqlite(config).await?),
            DialectKind::MySql | DialectKind::MariaDb => Self::MySql(connect_mysql(config).await?),
        };
        Ok(pool)
    }

    /// Acquires a connection and pings it.
    pub async fn is_valid(&self) -> bool {
        let result = match self {
            Self::MySql(pool) => match pool.acquire().await {
                Ok(mut conn) => conn.ping().await,
                Err(e) => Err(e),
            },
            Self::Sqlite(pool) => match pool.acquire().await {
                Ok(mut conn) => conn.ping().await,
                Err(e) => Err(e),
            },
        };
        if let Err(e) = &result {
            warn!(error = %e, "Connection check failed");
        }
        result.is_ok()
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }

    pub(crate) async fn begin(&self) -> DriverResult<TxInner> {
        Ok(match self {
            Self::MySql(pool) => TxInner::MySql(pool.begin().await?),
            Self::Sqlite(pool) => TxInner::Sqlite(pool.begin().await?),
        })
    }
}

impl From<SqlitePool> for Pool {
    fn from(pool: SqlitePool) -> Self {
        Self::Sqlite(pool)
    }
}

impl From<MySqlPool> for Pool {
    fn from(pool: MySqlPool) -> Self {
        Self::MySql(pool)
    }
}

async fn connect_sqlite(config: &DatabaseConfig) -> Result<SqlitePool> {
    let connect = |e| Error::database("connect", None, e);
    let pool = match &config.path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
                .connect_with(options)
                .await
                .map_err(connect)?
        }
        None => {
            let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(connect)?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
                .connect_with(options)
                .await
                .map_err(connect)?
        }
    };
    Ok(pool)
}

async fn connect_mysql(config: &DatabaseConfig) -> Result<MySqlPool> {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password);
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
        .map_err(|e| Error::database("connect", None, e))
}

/// An open sqlx transaction. Dropping it rolls back.
pub(crate) enum TxInner {
    MySql(sqlx::Transaction<'static, MySql>),
    Sqlite(sqlx::Transaction<'static, Sqlite>),
}

impl TxInner {
    pub(crate) async fn commit(self) -> DriverResult<()> {
        match self {
            Self::MySql(tx) => tx.commit().await,
            Self::Sqlite(tx) => tx.commit().await,
        }
    }

    pub(crate) async fn rollback(self) -> DriverResult<()> {
        match self {
            Self::MySql(tx) => tx.rollback().await,
            Self::Sqlite(tx) => tx.rollback().await,
        }
    }
}

/// Something statements can run on: a pool or an open transaction.
pub(crate) trait Session {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<QueryOutcome>;

    async fn fetch_all(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<Vec<RawRow>>;

    /// Runs `sql` once per parameter row and returns the summed row count.
    /// On a pool the rows run inside one transaction.
    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DriverResult<u64>;
}

impl Session for Pool {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<QueryOutcome> {
        match self {
            Self::MySql(pool) => mysql_execute(&*pool, sql, params).await,
            Self::Sqlite(pool) => sqlite_execute(&*pool, sql, params).await,
        }
    }

    async fn fetch_all(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<Vec<RawRow>> {
        match self {
            Self::MySql(pool) => mysql_fetch(&*pool, sql, params).await,
            Self::Sqlite(pool) => sqlite_fetch(&*pool, sql, params).await,
        }
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DriverResult<u64> {
        let mut tx = self.begin().await?;
        let total = tx.execute_batch(sql, rows).await?;
        tx.commit().await?;
        Ok(total)
    }
}

impl Session for TxInner {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<QueryOutcome> {
        match self {
            Self::MySql(tx) => mysql_execute(&mut **tx, sql, params).await,
            Self::Sqlite(tx) => sqlite_execute(&mut **tx, sql, params).await,
        }
    }

    async fn fetch_all(&mut self, sql: &str, params: &[SqlValue]) -> DriverResult<Vec<RawRow>> {
        match self {
            Self::MySql(tx) => mysql_fetch(&mut **tx, sql, params).await,
            Self::Sqlite(tx) => sqlite_fetch(&mut **tx, sql, params).await,
        }
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DriverResult<u64> {
        let mut total = 0;
        for params in rows {
            total += self.execute(sql, params).await?.rows_affected;
        }
        debug!(rows = rows.len(), total, "Executed batch");
        Ok(total)
    }
}

macro_rules! bind_params {
    ($db:ty, $sql:expr, $params:expr) => {{
        let mut query = sqlx::query::<$db>($sql);
        for param in $params {
            query = match param {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.as_str()),
                SqlValue::Blob(v) => query.bind(v.as_slice()),
            };
        }
        query
    }};
}

async fn sqlite_execute<'c, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> DriverResult<QueryOutcome>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let result = bind_params!(Sqlite, sql, params).execute(executor).await?;
    Ok(QueryOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: Some(result.last_insert_rowid()).filter(|id| *id > 0),
    })
}

async fn sqlite_fetch<'c, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> DriverResult<Vec<RawRow>>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let rows = bind_params!(Sqlite, sql, params).fetch_all(executor).await?;
    rows.iter().map(decode_sqlite).collect()
}

async fn mysql_execute<'c, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> DriverResult<QueryOutcome>
where
    E: sqlx::Executor<'c, Database = MySql>,
{
    let result = bind_params!(MySql, sql, params).execute(executor).await?;
    Ok(QueryOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id: i64::try_from(result.last_insert_id()).ok().filter(|id| *id > 0),
    })
}

async fn mysql_fetch<'c, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> DriverResult<Vec<RawRow>>
where
    E: sqlx::Executor<'c, Database = MySql>,
{
    let rows = bind_params!(MySql, sql, params).fetch_all(executor).await?;
    rows.iter().map(decode_mysql).collect()
}

/// SQLite reports the storage class of each value, which is all the
/// typing it has.
fn decode_sqlite(row: &SqliteRow) -> DriverResult<RawRow> {
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
            }
        };
        values.push((column.name().to_string(), value));
    }
    Ok(values)
}

/// Decodes by the column's declared MySQL type name.
fn decode_mysql(row: &MySqlRow) -> DriverResult<RawRow> {
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "NULL" => SqlValue::Null,
                "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked::<bool, _>(i)?),
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                    SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?)
                }
                "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
                | "BIGINT UNSIGNED" | "YEAR" => {
                    let v = row.try_get_unchecked::<u64, _>(i)?;
                    SqlValue::Int(i64::try_from(v).map_err(|e| sqlx::Error::Decode(Box::new(e)))?)
                }
                "FLOAT" => SqlValue::Float(f64::from(row.try_get_unchecked::<f32, _>(i)?)),
                "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
                "DATETIME" | "TIMESTAMP" => SqlValue::Text(
                    row.try_get_unchecked::<NaiveDateTime, _>(i)?
                        .format(TIMESTAMP_FORMAT)
                        .to_string(),
                ),
                "DATE" => SqlValue::Text(
                    row.try_get_unchecked::<NaiveDate, _>(i)?
                        .format("%Y-%m-%d")
                        .to_string(),
                ),
                "TIME" => SqlValue::Text(
                    row.try_get_unchecked::<NaiveTime, _>(i)?
                        .format("%H:%M:%S")
                        .to_string(),
                ),
                "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT"
                | "GEOMETRY" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                // DECIMAL and JSON arrive as text and stay lossless that way.
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
            }
        };
        values.push((column.name().to_string(), value));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory() -> Pool {
        Pool::connect(&DatabaseConfig::sqlite_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_memory_database_survives_between_calls() {
        let mut pool = memory().await;
        pool.execute("CREATE TABLE t (v INTEGER)", &[]).await.unwrap();
        pool.execute("INSERT INTO t (v) VALUES (?)", &[SqlValue::Int(7)])
            .await
            .unwrap();
        let rows = pool.fetch_all("SELECT v FROM t", &[]).await.unwrap();
        assert_eq!(rows, vec![vec![("v".to_string(), SqlValue::Int(7))]]);
    }

    #[tokio::test]
    async fn test_sqlite_decodes_storage_classes() {
        let mut pool = memory().await;
        let rows = pool
            .fetch_all(
                "SELECT ? AS i, ? AS f, ? AS s, ? AS b, ? AS n",
                &[
                    SqlValue::Int(3),
                    SqlValue::Float(1.5),
                    SqlValue::Text("x".into()),
                    SqlValue::Blob(vec![1, 2]),
                    SqlValue::Null,
                ],
            )
            .await
            .unwrap();
        let values: Vec<SqlValue> = rows[0].iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(
            values,
            vec![
                SqlValue::Int(3),
                SqlValue::Float(1.5),
                SqlValue::Text("x".into()),
                SqlValue::Blob(vec![1, 2]),
                SqlValue::Null,
            ]
        );
    }

    #[tokio::test]
    async fn test_insert_reports_rowid() {
        let mut pool = memory().await;
        pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)", &[])
            .await
            .unwrap();
        let outcome = pool
            .execute("INSERT INTO t (v) VALUES (?)", &[SqlValue::Text("a".into())])
            .await
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.last_insert_id, Some(1));
    }

    #[tokio::test]
    async fn test_batch_on_pool_is_atomic() {
        let mut pool = memory().await;
        pool.execute("CREATE TABLE t (v INTEGER NOT NULL)", &[]).await.unwrap();
        let rows = vec![vec![SqlValue::Int(1)], vec![SqlValue::Null]];
        assert!(pool.execute_batch("INSERT INTO t (v) VALUES (?)", &rows).await.is_err());
        let count = pool.fetch_all("SELECT COUNT(*) AS c FROM t", &[]).await.unwrap();
        assert_eq!(count[0][0].1, SqlValue::Int(0));
    }

    #[tokio::test]
    async fn test_is_valid() {
        let pool = memory().await;
        assert!(pool.is_valid().await);
        pool.close().await;
        assert!(!pool.is_valid().await);
    }
}
