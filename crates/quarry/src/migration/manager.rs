//! Migration runner.

use std::collections::HashSet;

use quarry_core::{ColumnDefinition, ColumnProbe, DatabaseConfig, Schema, SchemaKind, SqlValue};
use tracing::{debug, info, warn};

use super::{Ledger, Migration, MigrationPlan};
use crate::database::Database;
use crate::driver::Session;
use crate::error::Result;
use crate::executor;

/// What one [`MigrationManager::run`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Migrations executed for the first time.
    pub applied: Vec<String>,
    /// Already-applied migrations that had missing columns added.
    pub patched: Vec<String>,
}

impl MigrationReport {
    /// Returns true when the run changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.patched.is_empty()
    }
}

/// Registered migrations and the ledger they are recorded in.
///
/// Build one at startup, register migrations in the order they must run,
/// then call [`MigrationManager::run`].
///
/// ```no_run
/// use quarry::migration::{Migration, MigrationManager, MigrationPlan};
/// use quarry::{Database, DatabaseConfig};
///
/// struct CreateUsers;
///
/// impl Migration for CreateUsers {
///     fn name(&self) -> &str {
///         "0001_users"
///     }
///
///     fn up(&self, plan: &mut MigrationPlan) {
///         plan.create("users", |t| {
///             t.auto_increment_big_int("id");
///             t.string("name", 50);
///         });
///     }
/// }
///
/// # async fn run() -> quarry::Result<()> {
/// let db = Database::connect(DatabaseConfig::sqlite("data/app.db")).await?;
/// let mut manager = MigrationManager::new();
/// manager.register(CreateUsers);
/// manager.run(&db).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MigrationManager {
    ledger: Ledger,
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationManager {
    /// Creates a manager using the default `migrations` ledger table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the ledger in `table` instead.
    #[must_use]
    pub fn with_ledger_table(mut self, table: &str) -> Self {
        self.ledger = Ledger::new(table);
        self
    }

    /// Returns the ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Appends a migration. Migrations run in registration order.
    pub fn register(&mut self, migration: impl Migration + 'static) -> &mut Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Names of the registered migrations, in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.migrations.iter().map(|m| m.name())
    }

    /// Applies new migrations and reconciles alter-eligible ones.
    ///
    /// A migration missing from the ledger has every descriptor of its plan
    /// executed, then gets one ledger entry. An already-recorded,
    /// alter-eligible migration has its create and alter descriptors
    /// compared against the live tables; missing columns are added as
    /// nullable columns and the migration is recorded again.
    ///
    /// # Errors
    ///
    /// Stops at the first failing statement. The failing migration is not
    /// recorded.
    pub async fn run(&self, database: &Database) -> Result<MigrationReport> {
        let config = database.config();
        let mut session = database.pool().clone();
        self.ledger.ensure(&mut session, config).await?;
        let applied = self.ledger.applied(&mut session, config).await?;

        let mut report = MigrationReport::default();
        for migration in &self.migrations {
            let name = migration.name();
            let mut plan = MigrationPlan::default();
            migration.up(&mut plan);
            let mut schemas = plan.into_schemas();
            for schema in &mut schemas {
                schema.set_migration(name);
            }

            if !applied.contains(name) {
                info!(migration = name, statements = schemas.len(), "Applying migration");
                for schema in &schemas {
                    executor::execute(&mut session, config, schema).await?;
                }
                self.ledger.record(&mut session, config, name).await?;
                report.applied.push(name.to_string());
            } else if migration.alter_eligible() {
                if reconcile(&mut session, config, &schemas).await? {
                    self.ledger.record(&mut session, config, name).await?;
                    report.patched.push(name.to_string());
                }
            } else {
                debug!(migration = name, "Migration already applied");
            }
        }
        info!(
            applied = report.applied.len(),
            patched = report.patched.len(),
            "Migrations complete"
        );
        Ok(report)
    }
}

/// Adds missing columns. Returns true if any column was added.
async fn reconcile<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schemas: &[Schema],
) -> Result<bool> {
    let mut patched = false;
    for schema in schemas
        .iter()
        .filter(|s| matches!(s.kind(), SchemaKind::Create | SchemaKind::Alter))
    {
        let Some(missing) = missing_columns(session, config, schema).await? else {
            warn!(table = schema.table(), "Table not found, skipping column reconciliation");
            continue;
        };
        if missing.is_empty() {
            continue;
        }
        let names: Vec<&str> = missing.iter().map(|c| c.name.as_str()).collect();
        info!(
            migration = schema.migration().unwrap_or_default(),
            table = schema.table(),
            columns = ?names,
            "Adding missing columns"
        );
        let alter = Schema::alter(schema.table(), |t| {
            for column in &missing {
                let mut column = column.clone();
                column.primary_key = false;
                column.auto_increment = false;
                t.add_column(column);
            }
        });
        executor::execute(session, config, &alter).await?;
        patched = true;
    }
    Ok(patched)
}

/// Declared columns the live table lacks, or `None` when the table itself
/// does not exist.
async fn missing_columns<S: Session>(
    session: &mut S,
    config: &DatabaseConfig,
    schema: &Schema,
) -> Result<Option<Vec<ColumnDefinition>>> {
    let table = config.replace_prefix(schema.table());
    let probe = config
        .dialect()
        .column_probe(&table, config.database.as_deref(), schema.columns());
    let missing: Vec<ColumnDefinition> = match probe {
        ColumnProbe::TableInfo(statement) => {
            let rows = executor::fetch(session, config, "introspect", &table, &statement).await?;
            if rows.is_empty() {
                return Ok(None);
            }
            let live: HashSet<String> = rows
                .into_iter()
                .flatten()
                .filter(|(column, _)| column == "name")
                .filter_map(|(_, value)| match value {
                    SqlValue::Text(name) => Some(name.to_lowercase()),
                    _ => None,
                })
                .collect();
            schema
                .columns()
                .iter()
                .filter(|c| !live.contains(&c.name.to_lowercase()))
                .cloned()
                .collect()
        }
        ColumnProbe::PerColumn { table: exists, columns } => {
            if executor::fetch_count(session, config, &table, &exists).await? == 0 {
                return Ok(None);
            }
            let mut missing = Vec::new();
            for (name, statement) in columns {
                if executor::fetch_count(session, config, &table, &statement).await? == 0 {
                    missing.extend(schema.columns().iter().find(|c| c.name == name).cloned());
                }
            }
            missing
        }
    };
    Ok(Some(missing))
}
