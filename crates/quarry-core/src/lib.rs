//! # quarry-core
//!
//! Schema descriptors, the condition model and dialect-aware SQL
//! compilation for MySQL, MariaDB and SQLite.
//!
//! A [`Schema`] describes one table-scoped operation. [`compile`] turns it
//! into SQL text and ordered parameters for a given [`Dialect`]. Nothing in
//! this crate touches a database; see the `quarry` crate for execution.
//!
//! ```
//! use quarry_core::{compile, Schema, SqlValue};
//!
//! let mut query = Schema::select("users");
//! query.where_op("age", ">", 1);
//! let statement = compile::select(&query).unwrap();
//! assert_eq!(statement.sql, "SELECT * FROM `users` WHERE `age` > ?");
//! assert_eq!(statement.params, vec![SqlValue::Int(1)]);
//! ```

pub mod blob;
pub mod compile;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod types;
pub mod value;

pub use blob::{AllowList, BlobType, Serialized};
pub use compile::{BatchStatement, Statement};
pub use condition::{ColumnDefinition, DefaultExpr, JoinFilter, JoinKind};
pub use config::{DatabaseConfig, PREFIX_PLACEHOLDER};
pub use dialect::{
    ColumnProbe, Dialect, DialectKind, MariaDbDialect, MySqlDialect, SqliteDialect,
};
pub use error::{Error, Result};
pub use mapping::{FieldContext, FieldType, Record, Row};
pub use schema::{ColumnBuilder, Schema, SchemaKind};
pub use types::SqlType;
pub use value::{SqlValue, ToSqlValue};

