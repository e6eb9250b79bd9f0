//! The migration ledger table.
//!
//! One row per recorded application: the migration name and when it was
//! recorded. A name may appear more than once, since an alter-eligible
//! migration is recorded again each time reconciliation patches it.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use quarry_core::{DatabaseConfig, Schema};
use quarry_derive::Record;

use crate::database::Database;
use crate::driver::Session;
use crate::error::Result;
use crate::executor;

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "migrations";

/// One recorded migration application.
#[derive(Debug, Clone, PartialEq, Eq, Record)]
pub struct LedgerEntry {
    /// Migration name.
    pub migration: String,
    /// When the entry was written.
    pub created_at: Option<NaiveDateTime>,
}

/// Reads and writes the ledger table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    table: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_TABLE)
    }
}

impl Ledger {
    /// Creates a ledger stored in `table`. The name may use `%prefix%`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the ledger table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Database`] when the ledger table cannot be read or created.
    pub async fn init(&self, database: &Database) -> Result<()> {
        self.ensure(&mut database.pool().clone(), database.config()).await
    }

    /// Every entry, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Database`] when the ledger table cannot be read or created.
    pub async fn list(&self, database: &Database) -> Result<Vec<LedgerEntry>> {
        self.entries(&mut database.pool().clone(), database.config()).await
    }

    pub(crate) async fn ensure<S: Session>(
        &self,
        session: &mut S,
        config: &DatabaseConfig,
    ) -> Result<()> {
        let create = Schema::create(&self.table, |t| {
            t.text("migration");
            t.created_at();
        });
        executor::execute(session, config, &create).await?;
        Ok(())
    }

    /// Every entry, in insertion order.
    pub(crate) async fn entries<S: Session>(
        &self,
        session: &mut S,
        config: &DatabaseConfig,
    ) -> Result<Vec<LedgerEntry>> {
        executor::select_records(session, config, &Schema::select(&self.table)).await
    }

    /// Names of every migration recorded at least once.
    pub(crate) async fn applied<S: Session>(
        &self,
        session: &mut S,
        config: &DatabaseConfig,
    ) -> Result<HashSet<String>> {
        let entries = self.entries(session, config).await?;
        Ok(entries.into_iter().map(|entry| entry.migration).collect())
    }

    /// Appends an entry for `migration`.
    pub(crate) async fn record<S: Session>(
        &self,
        session: &mut S,
        config: &DatabaseConfig,
        migration: &str,
    ) -> Result<()> {
        let insert = Schema::insert(&self.table, |t| {
            t.string_value("migration", migration);
        });
        executor::execute(session, config, &insert).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Pool;

    #[tokio::test]
    async fn test_ensure_is_idempotent_and_entries_keep_order() {
        let config = DatabaseConfig::sqlite_memory();
        let mut pool = Pool::connect(&config).await.unwrap();
        let ledger = Ledger::default();
        ledger.ensure(&mut pool, &config).await.unwrap();
        ledger.ensure(&mut pool, &config).await.unwrap();

        ledger.record(&mut pool, &config, "0001_users").await.unwrap();
        ledger.record(&mut pool, &config, "0002_posts").await.unwrap();
        ledger.record(&mut pool, &config, "0001_users").await.unwrap();

        let entries = ledger.entries(&mut pool, &config).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.migration.as_str()).collect();
        assert_eq!(names, ["0001_users", "0002_posts", "0001_users"]);
        assert!(entries.iter().all(|e| e.created_at.is_some()));

        let applied = ledger.applied(&mut pool, &config).await.unwrap();
        assert_eq!(applied.len(), 2);
        assert!(applied.contains("0002_posts"));
    }
}
