//! Schema descriptors.
//!
//! A [`Schema`] names a table, an operation kind and the conditions that
//! operation needs. It is built with closures and compiled per dialect by
//! [`crate::compile`].
//!
//! ```
//! use quarry_core::{Schema, SqliteDialect, compile};
//!
//! let schema = Schema::create("users", |t| {
//!     t.auto_increment("id");
//!     t.string("name", 50);
//!     t.integer("age");
//! });
//! let statements = compile::statements(&schema, &SqliteDialect::new()).unwrap();
//! assert_eq!(
//!     statements[0].sql,
//!     "CREATE TABLE IF NOT EXISTS `users` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, \
//!      `name` VARCHAR(50) NOT NULL, `age` INT NOT NULL)"
//! );
//! ```

mod builder;

pub use builder::ColumnBuilder;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::blob::{self, BlobType};
use crate::condition::{
    ColumnDefinition, DefaultExpr, JoinFilter, JoinKind, JoinPredicate, PredicateKind,
    SelectProjection, WherePredicate,
};
use crate::error::{Error, Result};
use crate::mapping::Record;
use crate::types::{SqlType, DEFAULT_DECIMAL};
use crate::value::{SqlValue, ToSqlValue};

/// Operation a descriptor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `CREATE TABLE IF NOT EXISTS`
    Create,
    /// `ALTER TABLE ... ADD COLUMN`
    Alter,
    /// `ALTER TABLE ... MODIFY COLUMN`
    Modify,
    /// `ALTER TABLE ... RENAME TO`
    Rename,
    /// `DROP TABLE`
    Drop,
    /// `CREATE INDEX`
    CreateIndex,
    /// `INSERT`
    Insert,
    /// `INSERT INTO target (...) SELECT ... FROM source`
    InsertAll,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// Insert or update on key conflict.
    Upsert,
    /// `SELECT`
    Select,
    /// `SELECT COUNT(*)`
    SelectCount,
}

impl SchemaKind {
    /// Short operation name used in errors and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Alter => "alter",
            Self::Modify => "modify",
            Self::Rename => "rename",
            Self::Drop => "drop",
            Self::CreateIndex => "create index",
            Self::Insert => "insert",
            Self::InsertAll => "insert all",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Upsert => "upsert",
            Self::Select => "select",
            Self::SelectCount => "count",
        }
    }

    /// Returns true for kinds that read rows instead of executing.
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::Select | Self::SelectCount)
    }
}

/// Direction of an `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// A table-scoped operation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) table: String,
    pub(crate) kind: SchemaKind,
    pub(crate) columns: Vec<ColumnDefinition>,
    pub(crate) predicates: Vec<WherePredicate>,
    pub(crate) joins: Vec<JoinPredicate>,
    pub(crate) projections: Vec<SelectProjection>,
    pub(crate) primary_keys: Vec<String>,
    pub(crate) foreign_keys: Vec<String>,
    pub(crate) target_table: Option<String>,
    pub(crate) order_by: Vec<(String, Order)>,
    pub(crate) distinct: bool,
    pub(crate) migration: Option<String>,
    errors: Vec<String>,
}

impl Schema {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new(table: &str, kind: SchemaKind) -> Self {
        Self {
            table: table.to_string(),
            kind,
            columns: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            projections: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            target_table: None,
            order_by: Vec::new(),
            distinct: false,
            migration: None,
            errors: Vec::new(),
        }
    }

    fn build(table: &str, kind: SchemaKind, f: impl FnOnce(&mut Self)) -> Self {
        let mut schema = Self::new(table, kind);
        f(&mut schema);
        schema
    }

    /// `CREATE TABLE IF NOT EXISTS`.
    pub fn create(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Create, f)
    }

    /// Adds columns to an existing table. Added columns are always nullable.
    pub fn alter(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Alter, f)
    }

    /// Redefines existing columns.
    pub fn modify(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Modify, f)
    }

    /// Renames `table` to `new_name`.
    #[must_use]
    pub fn rename(table: &str, new_name: &str) -> Self {
        let mut schema = Self::new(table, SchemaKind::Rename);
        schema.target_table = Some(new_name.to_string());
        schema
    }

    /// `DROP TABLE`.
    #[must_use]
    pub fn drop(table: &str) -> Self {
        Self::new(table, SchemaKind::Drop)
    }

    /// Index on a single column, named `idx_<table>_<column>`.
    #[must_use]
    pub fn create_index(table: &str, column: &str) -> Self {
        let mut schema = Self::new(table, SchemaKind::CreateIndex);
        schema.columns.push(ColumnDefinition::new(column, SqlType::Text));
        schema
    }

    /// Inserts one row.
    pub fn insert(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Insert, f)
    }

    /// Copies the declared columns of every `source` row into `target`.
    /// Auto-increment columns are left out.
    pub fn insert_all(source: &str, target: &str, f: impl FnOnce(&mut Self)) -> Self {
        let mut schema = Self::build(source, SchemaKind::InsertAll, f);
        schema.target_table = Some(target.to_string());
        schema
    }

    /// Updates rows matching the predicates.
    pub fn update(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Update, f)
    }

    /// Inserts a row or updates it when a key already exists.
    pub fn upsert(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Upsert, f)
    }

    /// Deletes rows matching the predicates.
    pub fn delete(table: &str, f: impl FnOnce(&mut Self)) -> Self {
        Self::build(table, SchemaKind::Delete, f)
    }

    /// Selects rows. Add predicates, joins and projections afterwards.
    #[must_use]
    pub fn select(table: &str) -> Self {
        Self::new(table, SchemaKind::Select)
    }

    /// Counts rows matching the predicates.
    #[must_use]
    pub fn select_count(table: &str) -> Self {
        Self::new(table, SchemaKind::SelectCount)
    }

    /// `CREATE TABLE` with the columns declared by `R`.
    #[must_use]
    pub fn create_record<R: Record>(table: &str) -> Self {
        Self::build(table, SchemaKind::Create, |t| R::describe(t, None))
    }

    /// Adds the columns declared by `R` to an existing table.
    #[must_use]
    pub fn alter_record<R: Record>(table: &str) -> Self {
        Self::build(table, SchemaKind::Alter, |t| R::describe(t, None))
    }

    /// Inserts `record`.
    #[must_use]
    pub fn insert_record<R: Record>(table: &str, record: &R) -> Self {
        Self::build(table, SchemaKind::Insert, |t| R::describe(t, Some(record)))
    }

    /// Upserts `record`.
    #[must_use]
    pub fn upsert_record<R: Record>(table: &str, record: &R) -> Self {
        Self::build(table, SchemaKind::Upsert, |t| R::describe(t, Some(record)))
    }

    /// Updates `record`, matching on its primary-key columns.
    #[must_use]
    pub fn update_record<R: Record>(table: &str, record: &R) -> Self {
        let described = Self::build(table, SchemaKind::Create, |t| R::describe(t, Some(record)));
        let mut schema = Self::new(table, SchemaKind::Update);
        schema.errors = described.errors;
        for column in described.columns {
            if column.primary_key || column.auto_increment {
                let value = column.bound_value();
                schema.where_eq(&column.name, value);
            } else {
                schema.columns.push(column);
            }
        }
        if schema.predicates.is_empty() {
            schema.push_error("record has no primary key to match on");
        }
        schema
    }

    /// Table name as given.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Operation kind.
    #[must_use]
    pub const fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Declared columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// WHERE predicates, in order.
    #[must_use]
    pub fn predicates(&self) -> &[WherePredicate] {
        &self.predicates
    }

    /// Quoted primary-key column names.
    #[must_use]
    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// Rename or copy target.
    #[must_use]
    pub fn target_table(&self) -> Option<&str> {
        self.target_table.as_deref()
    }

    /// Name of the migration that declared this descriptor, if any.
    #[must_use]
    pub fn migration(&self) -> Option<&str> {
        self.migration.as_deref()
    }

    /// Marks the descriptor as owned by a migration.
    pub fn set_migration(&mut self, name: &str) {
        self.migration = Some(name.to_string());
    }

    pub(crate) fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Reports misuse recorded while building, and shapes the kind cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] describing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.errors.clone();
        match self.kind {
            SchemaKind::Create
            | SchemaKind::Alter
            | SchemaKind::Modify
            | SchemaKind::Insert
            | SchemaKind::InsertAll
            | SchemaKind::Update
            | SchemaKind::Upsert
                if self.columns.is_empty() =>
            {
                problems.push(format!("{} needs at least one column", self.kind.as_str()));
            }
            SchemaKind::CreateIndex if self.columns.len() != 1 => {
                problems.push(String::from("create index needs exactly one column"));
            }
            SchemaKind::Rename | SchemaKind::InsertAll if self.target_table.is_none() => {
                problems.push(format!("{} needs a target table", self.kind.as_str()));
            }
            _ => {}
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid(&self.table, problems.join("; ")))
        }
    }

    // Column declarations.

    /// Appends a column definition.
    pub fn add_column(&mut self, column: ColumnDefinition) -> ColumnBuilder<'_> {
        self.columns.push(column);
        let index = self.columns.len() - 1;
        ColumnBuilder::new(self, index)
    }

    fn typed(&mut self, name: &str, sql_type: SqlType) -> ColumnBuilder<'_> {
        self.add_column(ColumnDefinition::new(name, sql_type))
    }

    /// `VARCHAR(length)` column.
    pub fn string(&mut self, name: &str, length: u32) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Varchar(length))
    }

    /// `TEXT` column.
    pub fn text(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Text)
    }

    /// `LONGTEXT` column.
    pub fn long_text(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::LongText)
    }

    /// `INT` column.
    pub fn integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Integer)
    }

    /// `BIGINT` column.
    pub fn big_int(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::BigInt)
    }

    /// `DECIMAL(65,30)` column.
    pub fn decimal(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.decimal_with(name, DEFAULT_DECIMAL.0, DEFAULT_DECIMAL.1)
    }

    /// `DECIMAL(precision,scale)` column.
    pub fn decimal_with(&mut self, name: &str, precision: u8, scale: u8) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Decimal(precision, scale))
    }

    /// `BOOLEAN` column.
    pub fn boolean(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Boolean)
    }

    /// UUID column, stored as `VARCHAR(36)`.
    pub fn uuid(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::UUID)
    }

    /// `JSON` column.
    pub fn json(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Json)
    }

    /// `BLOB` column.
    pub fn blob(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Blob)
    }

    /// `TIMESTAMP` column.
    pub fn timestamp(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Timestamp)
    }

    /// `DATE` column.
    pub fn date(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.typed(name, SqlType::Date)
    }

    /// `created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP`.
    pub fn created_at(&mut self) -> ColumnBuilder<'_> {
        self.timestamp("created_at").default_current_timestamp()
    }

    /// `updated_at`, refreshed on update where the dialect supports it.
    pub fn updated_at(&mut self) -> ColumnBuilder<'_> {
        let mut column = ColumnDefinition::new("updated_at", SqlType::Timestamp);
        column.default = Some(DefaultExpr::CurrentTimestampOnUpdate);
        self.add_column(column)
    }

    /// Both `created_at` and `updated_at`.
    pub fn timestamps(&mut self) -> &mut Self {
        self.created_at();
        self.updated_at();
        self
    }

    fn auto_increment_typed(&mut self, name: &str, sql_type: SqlType) -> ColumnBuilder<'_> {
        let mut column = ColumnDefinition::new(name, sql_type);
        column.auto_increment = true;
        column.primary_key = true;
        let quoted = column.quoted_name();
        self.primary_keys.push(quoted);
        self.add_column(column)
    }

    /// Auto-incrementing `INT` primary key.
    pub fn auto_increment(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.auto_increment_typed(name, SqlType::Integer)
    }

    /// Auto-incrementing `BIGINT` primary key.
    pub fn auto_increment_big_int(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.auto_increment_typed(name, SqlType::BigInt)
    }

    // Value-carrying declarations for data descriptors.

    /// String value in a `VARCHAR(255)` column.
    pub fn string_value(&mut self, name: &str, value: impl Into<String>) -> ColumnBuilder<'_> {
        self.string(name, 255).value(value.into())
    }

    /// Integer value in a `BIGINT` column.
    pub fn big_int_value(&mut self, name: &str, value: i64) -> ColumnBuilder<'_> {
        self.big_int(name).value(value)
    }

    /// Integer value in an `INT` column.
    pub fn integer_value(&mut self, name: &str, value: i32) -> ColumnBuilder<'_> {
        self.integer(name).value(value)
    }

    /// Boolean value.
    pub fn bool_value(&mut self, name: &str, value: bool) -> ColumnBuilder<'_> {
        self.boolean(name).value(value)
    }

    /// Decimal value.
    pub fn decimal_value(&mut self, name: &str, value: Decimal) -> ColumnBuilder<'_> {
        self.decimal(name).value(value)
    }

    /// Float value in a `DECIMAL` column.
    pub fn float_value(&mut self, name: &str, value: f64) -> ColumnBuilder<'_> {
        self.decimal(name).value(value)
    }

    /// UUID value.
    pub fn uuid_value(&mut self, name: &str, value: Uuid) -> ColumnBuilder<'_> {
        self.uuid(name).value(value)
    }

    /// Timestamp value.
    pub fn date_value(&mut self, name: &str, value: NaiveDateTime) -> ColumnBuilder<'_> {
        self.timestamp(name).value(value)
    }

    /// Raw bytes.
    pub fn blob_value(&mut self, name: &str, value: Vec<u8>) -> ColumnBuilder<'_> {
        self.blob(name).value(value)
    }

    /// JSON document.
    pub fn json_value(&mut self, name: &str, value: &serde_json::Value) -> ColumnBuilder<'_> {
        self.json(name).value(value)
    }

    /// Serialized object in a `BLOB` column, tagged with its type id.
    pub fn object<T: BlobType>(&mut self, name: &str, value: &T) -> ColumnBuilder<'_> {
        let encoded = blob::encode(value).map(SqlValue::Blob);
        self.blob(name).try_value(encoded)
    }

    // Predicates.

    /// `column = ?`
    pub fn where_eq(&mut self, column: &str, value: impl ToSqlValue) -> &mut Self {
        self.where_op(column, "=", value)
    }

    /// `column <operator> ?`
    pub fn where_op(&mut self, column: &str, operator: &str, value: impl ToSqlValue) -> &mut Self {
        self.predicates.push(WherePredicate::compare(
            None,
            column,
            operator,
            value.to_sql_value(),
        ));
        self
    }

    /// `prefix.column <operator> ?`
    pub fn where_prefixed(
        &mut self,
        prefix: &str,
        column: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> &mut Self {
        self.predicates.push(WherePredicate::compare(
            Some(prefix),
            column,
            operator,
            value.to_sql_value(),
        ));
        self
    }

    /// `column IS NULL`
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.predicates
            .push(WherePredicate::with_kind(None, column, PredicateKind::IsNull));
        self
    }

    /// `column IS NOT NULL`
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.predicates
            .push(WherePredicate::with_kind(None, column, PredicateKind::IsNotNull));
        self
    }

    /// `column IN (?, ...)`. Values are bound as text.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(None, column, values)
    }

    /// `prefix.column IN (?, ...)`
    pub fn where_in_prefixed<I, V>(&mut self, prefix: &str, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_in(Some(prefix), column, values)
    }

    fn push_in<I, V>(&mut self, prefix: Option<&str>, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values = values
            .into_iter()
            .map(|v| v.to_sql_value().to_text())
            .collect();
        self.predicates
            .push(WherePredicate::with_kind(prefix, column, PredicateKind::In(values)));
        self
    }

    // Joins.

    fn push_join(
        &mut self,
        kind: JoinKind,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
        filter: Option<JoinFilter>,
    ) -> &mut Self {
        self.joins.push(JoinPredicate {
            kind,
            primary_table: primary_table.to_string(),
            alias: alias.map(str::to_string),
            primary_column: primary_column.to_string(),
            foreign_table: foreign_table.to_string(),
            foreign_column: foreign_column.to_string(),
            filter,
        });
        self
    }

    /// `LEFT JOIN primary [AS alias] ON primary.column = foreign.column`
    pub fn left_join(
        &mut self,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
    ) -> &mut Self {
        self.push_join(
            JoinKind::Left,
            primary_table,
            alias,
            primary_column,
            foreign_table,
            foreign_column,
            None,
        )
    }

    /// Left join with an extra `AND alias.column = 'literal'`.
    pub fn left_join_and(
        &mut self,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
        filter: JoinFilter,
    ) -> &mut Self {
        self.push_join(
            JoinKind::Left,
            primary_table,
            alias,
            primary_column,
            foreign_table,
            foreign_column,
            Some(filter),
        )
    }

    /// `RIGHT JOIN`
    pub fn right_join(
        &mut self,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
    ) -> &mut Self {
        self.push_join(
            JoinKind::Right,
            primary_table,
            alias,
            primary_column,
            foreign_table,
            foreign_column,
            None,
        )
    }

    /// `INNER JOIN`
    pub fn inner_join(
        &mut self,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
    ) -> &mut Self {
        self.push_join(
            JoinKind::Inner,
            primary_table,
            alias,
            primary_column,
            foreign_table,
            foreign_column,
            None,
        )
    }

    /// `FULL OUTER JOIN`
    pub fn full_join(
        &mut self,
        primary_table: &str,
        alias: Option<&str>,
        primary_column: &str,
        foreign_table: &str,
        foreign_column: &str,
    ) -> &mut Self {
        self.push_join(
            JoinKind::Full,
            primary_table,
            alias,
            primary_column,
            foreign_table,
            foreign_column,
            None,
        )
    }

    // Projections.

    /// Selects `column`.
    pub fn add_select(&mut self, column: &str) -> &mut Self {
        self.projections.push(SelectProjection::new(None, column));
        self
    }

    /// Selects `prefix.column`.
    pub fn add_select_prefixed(&mut self, prefix: &str, column: &str) -> &mut Self {
        self.projections
            .push(SelectProjection::new(Some(prefix), column));
        self
    }

    /// Selects `[prefix.]column AS alias`.
    pub fn add_select_as(&mut self, prefix: Option<&str>, column: &str, alias: &str) -> &mut Self {
        self.projections
            .push(SelectProjection::new(prefix, column).alias(alias));
        self
    }

    /// Selects `COALESCE([prefix.]column, default) AS alias`.
    pub fn add_select_coalesce(
        &mut self,
        prefix: Option<&str>,
        column: &str,
        alias: &str,
        default: impl ToSqlValue,
    ) -> &mut Self {
        self.projections.push(
            SelectProjection::new(prefix, column)
                .alias(alias)
                .coalesce(default.to_sql_value()),
        );
        self
    }

    /// Appends `ORDER BY column ASC`. Dotted names are quoted per segment.
    pub fn order_by(&mut self, column: &str) -> &mut Self {
        self.order_by.push((column.to_string(), Order::Asc));
        self
    }

    /// Appends `ORDER BY column DESC`.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by.push((column.to_string(), Order::Desc));
        self
    }

    /// `SELECT DISTINCT`.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }
}
