//! Batch executors: many same-shaped descriptors in one round trip.
//!
//! Every entry point returns zero for an empty slice without touching the
//! database.

use quarry_core::compile;
use quarry_core::{DatabaseConfig, Schema};

use crate::driver::Session;
use crate::error::Result;
use crate::executor::{failed, log_sql, run, to_count};

/// One multi-row `INSERT` over all descriptors. Returns the affected rows.
pub(crate) async fn insert_batch<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schemas: &[Schema],
) -> Result<i64> {
    let (Some(statement), Some(first)) = (compile::insert_batch(schemas)?, schemas.first()) else {
        return Ok(0);
    };
    let outcome = run(session, config, "insert batch", first.table(), &statement).await?;
    Ok(to_count(outcome.rows_affected))
}

/// One multi-row upsert over all descriptors. Returns the affected rows as
/// the driver counts them.
pub(crate) async fn upsert_batch<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schemas: &[Schema],
) -> Result<i64> {
    let (Some(statement), Some(first)) =
        (compile::upsert_batch(schemas, config.dialect())?, schemas.first())
    else {
        return Ok(0);
    };
    let outcome = run(session, config, "upsert batch", first.table(), &statement).await?;
    Ok(to_count(outcome.rows_affected))
}

/// Runs the shared `UPDATE` once per descriptor inside one transaction and
/// returns the summed row count.
pub(crate) async fn update_batch<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schemas: &[Schema],
) -> Result<i64> {
    let (Some(batch), Some(first)) = (compile::update_batch(schemas)?, schemas.first()) else {
        return Ok(0);
    };
    let sql = config.replace_prefix(&batch.sql);
    log_sql(config, &sql);
    let affected = session
        .execute_batch(&sql, &batch.rows)
        .await
        .map_err(|e| failed(config, "update batch", first.table(), e))?;
    Ok(to_count(affected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Pool;
    use crate::executor::{execute, select_count};

    async fn setup() -> (Pool, DatabaseConfig) {
        let config = DatabaseConfig::sqlite_memory();
        let mut pool = Pool::connect(&config).await.unwrap();
        let create = Schema::create("scores", |t| {
            t.string("player", 20).primary();
            t.integer("points");
        });
        execute(&mut pool, &config, &create).await.unwrap();
        (pool, config)
    }

    fn row(player: &str, points: i32) -> Schema {
        Schema::insert("scores", |t| {
            t.string_value("player", player);
            t.integer_value("points", points);
        })
    }

    #[tokio::test]
    async fn test_empty_batches_are_noops() {
        let (mut pool, config) = setup().await;
        assert_eq!(insert_batch(&mut pool, &config, &[]).await.unwrap(), 0);
        assert_eq!(upsert_batch(&mut pool, &config, &[]).await.unwrap(), 0);
        assert_eq!(update_batch(&mut pool, &config, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_batch() {
        let (mut pool, config) = setup().await;
        let rows = [row("a", 1), row("b", 2), row("c", 3)];
        assert_eq!(insert_batch(&mut pool, &config, &rows).await.unwrap(), 3);
        let count = select_count(&mut pool, &config, &Schema::select_count("scores"))
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_update_batch_sums_rows() {
        let (mut pool, config) = setup().await;
        insert_batch(&mut pool, &config, &[row("a", 1), row("b", 2)])
            .await
            .unwrap();
        let updates: Vec<Schema> = [("a", 10), ("b", 20), ("zz", 30)]
            .into_iter()
            .map(|(player, points)| {
                let mut schema = Schema::update("scores", |t| {
                    t.integer_value("points", points);
                });
                schema.where_eq("player", player);
                schema
            })
            .collect();
        assert_eq!(update_batch(&mut pool, &config, &updates).await.unwrap(), 2);

        let mut high = Schema::select_count("scores");
        high.where_op("points", ">=", 10);
        assert_eq!(select_count(&mut pool, &config, &high).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_batch_updates_existing_keys() {
        let (mut pool, config) = setup().await;
        insert_batch(&mut pool, &config, &[row("a", 1)]).await.unwrap();
        let upserts: Vec<Schema> = [("a", 5), ("b", 6)]
            .into_iter()
            .map(|(player, points)| {
                Schema::upsert("scores", |t| {
                    t.string_value("player", player).primary();
                    t.integer_value("points", points);
                })
            })
            .collect();
        upsert_batch(&mut pool, &config, &upserts).await.unwrap();

        let mut updated = Schema::select_count("scores");
        updated.where_eq("player", "a").where_eq("points", 5);
        assert_eq!(select_count(&mut pool, &config, &updated).await.unwrap(), 1);
        assert_eq!(
            select_count(&mut pool, &config, &Schema::select_count("scores"))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_mismatched_rows_are_rejected() {
        let (mut pool, config) = setup().await;
        let other = Schema::insert("scores", |t| {
            t.string_value("player", "x");
        });
        assert!(insert_batch(&mut pool, &config, &[row("a", 1), other])
            .await
            .is_err());
    }
}
