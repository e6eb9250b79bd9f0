//! Dialect-aware executors.
//!
//! Each call compiles a descriptor for the configured dialect, replaces the
//! table prefix placeholder, and runs the result on a [`Session`].

use std::sync::Arc;

use quarry_core::compile::{self, Statement};
use quarry_core::{
    DatabaseConfig, FieldContext, FieldType, Record, Row, Schema, SchemaKind, SqlValue,
};
use tracing::{debug, info, warn};

use crate::driver::{QueryOutcome, Session};
use crate::error::{Error, Result};

/// Runs an executable descriptor.
///
/// Inserts return the generated key when the driver reports one, and the
/// affected-row count otherwise. Every other kind returns the affected-row
/// count, summed over its statements.
pub(crate) async fn execute<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schema: &Schema,
) -> Result<i64> {
    let statements = compile::statements(schema, config.dialect())?;
    let operation = schema.kind().as_str();
    let mut affected = 0;
    let mut generated = None;
    for statement in &statements {
        let outcome = run(session, config, operation, schema.table(), statement).await?;
        affected += outcome.rows_affected;
        generated = outcome.last_insert_id;
    }
    match (schema.kind(), generated) {
        (SchemaKind::Insert, Some(id)) => Ok(id),
        _ => Ok(to_count(affected)),
    }
}

/// Runs a select descriptor and returns its rows.
pub(crate) async fn select_rows<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schema: &Schema,
) -> Result<Vec<Row>> {
    let statement = compile::select(schema)?;
    let rows = fetch(session, config, "select", schema.table(), &statement).await?;
    let allow_list = Arc::new(config.allow_list.clone());
    Ok(rows
        .into_iter()
        .map(|columns| Row::new(columns, Arc::clone(&allow_list)))
        .collect())
}

/// Runs a select descriptor and maps every row onto `R`, in row order.
pub(crate) async fn select_records<S: Session, R: Record>(
    session: &mut S,
    config: &DatabaseConfig,
    schema: &Schema,
) -> Result<Vec<R>> {
    let rows = select_rows(session, config, schema).await?;
    let records = rows.iter().map(R::from_row).collect::<quarry_core::Result<Vec<_>>>()?;
    Ok(records)
}

/// Counts the rows matching the descriptor's predicates.
pub(crate) async fn select_count<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schema: &Schema,
) -> Result<i64> {
    let statement = compile::select_count(schema)?;
    fetch_count(session, config, schema.table(), &statement).await
}

/// Runs a single-value `COUNT(*)` statement.
pub(crate) async fn fetch_count<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    table: &str,
    statement: &Statement,
) -> Result<i64> {
    let mut rows = fetch(session, config, "count", table, statement).await?;
    let value = rows
        .pop()
        .and_then(|mut row| row.pop())
        .map_or(SqlValue::Null, |(_, value)| value);
    let ctx = FieldContext {
        column: "COUNT(*)",
        allow_list: &config.allow_list,
    };
    Ok(i64::from_sql(value, &ctx)?)
}

/// Runs one compiled statement on `session`.
pub(crate) async fn run<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    operation: &'static str,
    table: &str,
    statement: &Statement,
) -> Result<QueryOutcome> {
    let sql = config.replace_prefix(&statement.sql);
    log_sql(config, &sql);
    session
        .execute(&sql, &statement.params)
        .await
        .map_err(|e| failed(config, operation, table, e))
}

pub(crate) async fn fetch<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    operation: &'static str,
    table: &str,
    statement: &Statement,
) -> Result<Vec<Vec<(String, SqlValue)>>> {
    let sql = config.replace_prefix(&statement.sql);
    log_sql(config, &sql);
    session
        .fetch_all(&sql, &statement.params)
        .await
        .map_err(|e| failed(config, operation, table, e))
}

pub(crate) fn log_sql(config: &DatabaseConfig, sql: &str) {
    if config.debug {
        info!(sql = %sql, "Executing SQL");
    } else {
        debug!(sql = %sql, "Executing SQL");
    }
}

pub(crate) fn failed(
    config: &DatabaseConfig,
    operation: &'static str,
    table: &str,
    source: sqlx::Error,
) -> Error {
    let table = config.replace_prefix(table);
    warn!(operation, table = %table, error = %source, "Database operation failed");
    Error::database(operation, Some(table.as_str()), source)
}

pub(crate) fn to_count(rows: u64) -> i64 {
    i64::try_from(rows).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Pool;

    async fn setup() -> (Pool, DatabaseConfig) {
        let config = DatabaseConfig::sqlite_memory().with_prefix("t_");
        let mut pool = Pool::connect(&config).await.unwrap();
        let create = Schema::create("%prefix%items", |t| {
            t.auto_increment("id");
            t.string("name", 20);
        });
        execute(&mut pool, &config, &create).await.unwrap();
        (pool, config)
    }

    #[tokio::test]
    async fn test_insert_returns_generated_key() {
        let (mut pool, config) = setup().await;
        for expected in 1..=2 {
            let insert = Schema::insert("%prefix%items", |t| {
                t.string_value("name", "x");
            });
            assert_eq!(execute(&mut pool, &config, &insert).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_prefix_is_replaced() {
        let (mut pool, _config) = setup().await;
        let rows = pool
            .fetch_all("SELECT name FROM sqlite_master WHERE name = 't_items'", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_names_operation_and_table() {
        let (mut pool, config) = setup().await;
        let insert = Schema::insert("%prefix%missing", |t| {
            t.string_value("name", "x");
        });
        let err = execute(&mut pool, &config, &insert).await.unwrap_err();
        match err {
            Error::Database {
                operation, table, ..
            } => {
                assert_eq!(operation, "insert");
                assert_eq!(table.as_deref(), Some("t_missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_select_kind_is_not_executable() {
        let (mut pool, config) = setup().await;
        let err = execute(&mut pool, &config, &Schema::select("%prefix%items"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Schema(quarry_core::Error::NotExecutable(_))));
    }

    #[tokio::test]
    async fn test_count_on_empty_table() {
        let (mut pool, config) = setup().await;
        let count = select_count(&mut pool, &config, &Schema::select_count("%prefix%items"))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
