//! Error types for execution and migrations.

/// Errors raised while talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A statement failed against the database.
    #[error(
        "Database operation '{operation}' failed{}",
        .table.as_ref().map(|t| format!(" on table '{t}'")).unwrap_or_default()
    )]
    Database {
        /// Operation name, such as `insert` or `count`.
        operation: &'static str,
        /// Table the operation targeted.
        table: Option<String>,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A descriptor was invalid, or a row could not be mapped.
    #[error(transparent)]
    Schema(#[from] quarry_core::Error),

    /// A transaction was used after commit or rollback.
    #[error("Transaction already {0}")]
    TransactionClosed(&'static str),

    /// IO error, such as creating the directory of a SQLite file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn database(
        operation: &'static str,
        table: Option<&str>,
        source: sqlx::Error,
    ) -> Self {
        Self::Database {
            operation,
            table: table.map(str::to_string),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_message_names_operation_and_table() {
        let err = Error::database("insert", Some("users"), sqlx::Error::RowNotFound);
        assert_eq!(
            err.to_string(),
            "Database operation 'insert' failed on table 'users'"
        );
    }

    #[test]
    fn test_database_message_without_table() {
        let err = Error::database("connect", None, sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Database operation 'connect' failed");
    }
}
