//! # quarry
//!
//! Runs [`quarry_core`] schema descriptors against MySQL, MariaDB and
//! SQLite through sqlx.
//!
//! - [`Database`]: pool plus configuration, with insert/update/upsert/
//!   delete/select helpers and batch variants
//! - [`Transaction`]: the same operations on one connection, committed or
//!   rolled back explicitly
//! - [`migration`]: ordered migrations recorded in a ledger table, with
//!   additive column reconciliation
//!
//! ```no_run
//! use quarry::{Database, DatabaseConfig, Record};
//!
//! #[derive(Debug, Record)]
//! struct User {
//!     #[column(auto_increment)]
//!     id: Option<i64>,
//!     #[column(sql_type = "varchar(50)")]
//!     name: String,
//!     age: i64,
//! }
//!
//! # async fn run() -> quarry::Result<()> {
//! let db = Database::connect(DatabaseConfig::sqlite("data/app.db")).await?;
//! db.execute(&quarry::Schema::create_record::<User>("users")).await?;
//! db.insert_record("users", &User { id: None, name: "a".into(), age: 1 }).await?;
//! let adults: Vec<User> = db
//!     .select("users", |q| {
//!         q.where_op("age", ">=", 18);
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod database;
mod driver;
pub mod error;
mod executor;
pub mod migration;
mod transaction;

pub use database::Database;
pub use driver::Pool;
pub use error::{Error, Result};
pub use transaction::Transaction;

pub use quarry_core::{
    AllowList, ColumnBuilder, ColumnDefinition, DatabaseConfig, Dialect, DialectKind, FieldType,
    JoinFilter, Record, Row, Schema, SchemaKind, Serialized, SqlType, SqlValue, ToSqlValue,
    text_enum,
};
pub use quarry_derive::Record;
