//! The condition model: column definitions, predicates, joins and projections.
//!
//! Conditions are plain data. Each one renders to a SQL fragment and, for
//! predicates, the parameter values that fragment binds.

mod column;
mod join;
mod predicate;
mod projection;

pub use column::{ColumnDefinition, DefaultExpr};
pub use join::{JoinFilter, JoinKind, JoinPredicate};
pub use predicate::{PredicateKind, WherePredicate};
pub use projection::SelectProjection;

/// Backtick-quotes a single identifier.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a possibly schema-qualified table name segment by segment.
#[must_use]
pub fn quote_table(name: &str) -> String {
    name.split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Renders `prefix.`column`` or `` `column` ``.
#[must_use]
pub fn column_reference(prefix: Option<&str>, column: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{}", quote_identifier(column)),
        None => quote_identifier(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_table_segments() {
        assert_eq!(quote_table("users"), "`users`");
        assert_eq!(
            quote_table("information_schema.COLUMNS"),
            "`information_schema`.`COLUMNS`"
        );
    }

    #[test]
    fn test_quote_escapes_backtick() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_column_reference() {
        assert_eq!(column_reference(Some("u"), "id"), "u.`id`");
        assert_eq!(column_reference(None, "id"), "`id`");
    }
}
