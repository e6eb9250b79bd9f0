//! The request helper facade.

use std::sync::Arc;

use quarry_core::{DatabaseConfig, Dialect, Record, Row, Schema};

use crate::batch;
use crate::driver::Pool;
use crate::error::{Error, Result};
use crate::executor;
use crate::transaction::Transaction;

/// A connection pool paired with the configuration used to compile and run
/// descriptors against it.
///
/// Cloning is cheap and shares the pool.
///
/// ```no_run
/// use quarry::{Database, DatabaseConfig};
///
/// # async fn run() -> quarry::Result<()> {
/// let db = Database::connect(DatabaseConfig::sqlite_memory()).await?;
/// db.execute(&quarry::Schema::create("users", |t| {
///     t.auto_increment_big_int("id");
///     t.string("name", 50);
///     t.integer("age");
/// }))
/// .await?;
/// let id = db
///     .insert("users", |t| {
///         t.string_value("name", "a");
///         t.integer_value("age", 1);
///     })
///     .await?;
/// assert_eq!(id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool,
    config: Arc<DatabaseConfig>,
}

impl Database {
    /// Opens a pool for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Database`] when the pool cannot be opened.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let pool = Pool::connect(&config).await?;
        Ok(Self::new(pool, config))
    }

    /// Wraps an existing pool. `config.dialect` must match the pool.
    #[must_use]
    pub fn new(pool: impl Into<Pool>, config: DatabaseConfig) -> Self {
        Self {
            pool: pool.into(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the pool.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Returns the dialect strategy.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.config.dialect()
    }

    /// Pings a pooled connection.
    pub async fn is_valid(&self) -> bool {
        self.pool.is_valid().await
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs an executable descriptor.
    ///
    /// Inserts return the generated key when there is one; everything else
    /// returns the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid or select descriptor and
    /// [`Error::Database`] when the statement fails.
    pub async fn execute(&self, schema: &Schema) -> Result<i64> {
        executor::execute(&mut self.pool.clone(), &self.config, schema).await
    }

    /// Runs a select descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn select_rows(&self, schema: &Schema) -> Result<Vec<Row>> {
        executor::select_rows(&mut self.pool.clone(), &self.config, schema).await
    }

    /// Runs a select descriptor and maps every row onto `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn select_records<R: Record>(&self, schema: &Schema) -> Result<Vec<R>> {
        executor::select_records(&mut self.pool.clone(), &self.config, schema).await
    }

    /// Counts rows matching a descriptor's predicates. Joins are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn select_count(&self, schema: &Schema) -> Result<i64> {
        executor::select_count(&mut self.pool.clone(), &self.config, schema).await
    }

    /// Inserts one row built by `f`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn insert(&self, table: &str, f: impl FnOnce(&mut Schema)) -> Result<i64> {
        self.execute(&Schema::insert(table, f)).await
    }

    /// Inserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn insert_record<R: Record>(&self, table: &str, record: &R) -> Result<i64> {
        self.execute(&Schema::insert_record(table, record)).await
    }

    /// Updates rows. `f` declares the new values and the predicates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn update(&self, table: &str, f: impl FnOnce(&mut Schema)) -> Result<i64> {
        self.execute(&Schema::update(table, f)).await
    }

    /// Updates the row matching the record's key columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn update_record<R: Record>(&self, table: &str, record: &R) -> Result<i64> {
        self.execute(&Schema::update_record(table, record)).await
    }

    /// Inserts a row, or updates it when its key already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn upsert(&self, table: &str, f: impl FnOnce(&mut Schema)) -> Result<i64> {
        self.execute(&Schema::upsert(table, f)).await
    }

    /// Upserts a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn upsert_record<R: Record>(&self, table: &str, record: &R) -> Result<i64> {
        self.execute(&Schema::upsert_record(table, record)).await
    }

    /// Deletes the rows matching the predicates `f` declares.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn delete(&self, table: &str, f: impl FnOnce(&mut Schema)) -> Result<i64> {
        self.execute(&Schema::delete(table, f)).await
    }

    /// Selects records; `f` adds predicates, joins and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn select<R: Record>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Schema),
    ) -> Result<Vec<R>> {
        let mut schema = Schema::select(table);
        f(&mut schema);
        self.select_records(&schema).await
    }

    /// Selects every row of `table` as records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn select_all<R: Record>(&self, table: &str) -> Result<Vec<R>> {
        self.select_records(&Schema::select(table)).await
    }

    /// Counts the rows matching the predicates `f` declares.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn count(&self, table: &str, f: impl FnOnce(&mut Schema)) -> Result<i64> {
        let mut schema = Schema::select_count(table);
        f(&mut schema);
        self.select_count(&schema).await
    }

    /// Inserts every row with one multi-row statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn insert_multiple(&self, schemas: &[Schema]) -> Result<i64> {
        batch::insert_batch(&mut self.pool.clone(), &self.config, schemas).await
    }

    /// Runs every update inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn update_multiple(&self, schemas: &[Schema]) -> Result<i64> {
        batch::update_batch(&mut self.pool.clone(), &self.config, schemas).await
    }

    /// Upserts every row with one multi-row statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an invalid descriptor or an unmappable row, and
    /// [`Error::Database`] when the statement fails.
    pub async fn upsert_multiple(&self, schemas: &[Schema]) -> Result<i64> {
        batch::upsert_batch(&mut self.pool.clone(), &self.config, schemas).await
    }

    /// Starts a transaction on a dedicated connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] when no connection can be acquired.
    pub async fn begin(&self) -> Result<Transaction> {
        let inner = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::database("begin", None, e))?;
        Ok(Transaction::new(inner, Arc::clone(&self.config)))
    }
}
