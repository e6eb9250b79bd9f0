//! Error types for descriptor building, compilation and row mapping.

use thiserror::Error;

/// Errors raised while compiling descriptors or reconstructing records.
#[derive(Debug, Error)]
pub enum Error {
    /// A descriptor was built with an invalid combination of calls.
    #[error("invalid schema for table `{table}`: {message}")]
    InvalidSchema {
        /// Table the descriptor targets.
        table: String,
        /// What is wrong with it.
        message: String,
    },

    /// A select descriptor was handed to the statement executor.
    #[error("`{0}` is a select descriptor and cannot be executed as a statement")]
    NotExecutable(String),

    /// The dialect has no rendering for the requested operation.
    #[error("{dialect} does not support {operation}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation name.
        operation: &'static str,
    },

    /// A NULL column was mapped onto a non-optional field.
    #[error("column `{0}` is NULL but the field is not optional")]
    UnexpectedNull(String),

    /// A column value could not be converted to the field type.
    #[error("cannot convert column `{column}`: {message}")]
    Conversion {
        /// Column name.
        column: String,
        /// Conversion failure.
        message: String,
    },

    /// A serialized blob named a type that is not allow-listed.
    #[error("serialized type `{0}` is not in the allow-list")]
    Forbidden(String),

    /// Unknown dialect name.
    #[error("unknown dialect `{0}`, expected mysql, mariadb or sqlite")]
    UnknownDialect(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(table: &str, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn conversion(column: &str, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
