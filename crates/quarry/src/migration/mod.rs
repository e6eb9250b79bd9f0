//! Migrations and the additive reconciliation run.
//!
//! A [`Migration`] fills a [`MigrationPlan`] with schema descriptors. The
//! [`MigrationManager`] executes the plan of every migration missing from
//! the ledger, and on later runs adds columns that alter-eligible
//! migrations declare but the live tables lack.

mod ledger;
mod manager;

pub use ledger::{Ledger, LedgerEntry, DEFAULT_LEDGER_TABLE};
pub use manager::{MigrationManager, MigrationReport};

use quarry_core::{Record, Schema};

/// A named group of schema changes, applied once.
pub trait Migration: Send + Sync {
    /// Name recorded in the ledger. Must be stable across releases.
    fn name(&self) -> &str;

    /// Whether later runs should add columns the plan declares but the
    /// live tables lack.
    fn alter_eligible(&self) -> bool {
        false
    }

    /// Declares the migration's descriptors. Called on every run, so it
    /// must only build descriptors.
    fn up(&self, plan: &mut MigrationPlan);
}

/// The descriptors a migration declares, in execution order.
#[derive(Debug, Default)]
pub struct MigrationPlan {
    schemas: Vec<Schema>,
}

impl MigrationPlan {
    /// `CREATE TABLE IF NOT EXISTS`.
    pub fn create(&mut self, table: &str, f: impl FnOnce(&mut Schema)) -> &mut Self {
        self.push(Schema::create(table, f))
    }

    /// `CREATE TABLE IF NOT EXISTS` with the columns of a record type.
    pub fn create_record<R: Record>(&mut self, table: &str) -> &mut Self {
        self.push(Schema::create_record::<R>(table))
    }

    /// One `ADD COLUMN` per declared column.
    pub fn alter(&mut self, table: &str, f: impl FnOnce(&mut Schema)) -> &mut Self {
        self.push(Schema::alter(table, f))
    }

    /// Redefines columns in place. Server dialects only.
    pub fn modify(&mut self, table: &str, f: impl FnOnce(&mut Schema)) -> &mut Self {
        self.push(Schema::modify(table, f))
    }

    /// Renames a table.
    pub fn rename(&mut self, table: &str, new_name: &str) -> &mut Self {
        self.push(Schema::rename(table, new_name))
    }

    /// Drops a table.
    pub fn drop(&mut self, table: &str) -> &mut Self {
        self.push(Schema::drop(table))
    }

    /// Indexes one column.
    pub fn create_index(&mut self, table: &str, column: &str) -> &mut Self {
        self.push(Schema::create_index(table, column))
    }

    /// Adds any executable descriptor, such as seed rows.
    pub fn push(&mut self, schema: Schema) -> &mut Self {
        self.schemas.push(schema);
        self
    }

    /// The declared descriptors.
    #[must_use]
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    fn into_schemas(self) -> Vec<Schema> {
        self.schemas
    }
}
