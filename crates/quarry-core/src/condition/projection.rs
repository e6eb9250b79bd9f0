use crate::value::SqlValue;

use super::column_reference;

/// A selected column, optionally prefixed, aliased or coalesced.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectProjection {
    prefix: Option<String>,
    column: String,
    alias: Option<String>,
    coalesce: Option<SqlValue>,
}

impl SelectProjection {
    /// Projection of a single column.
    #[must_use]
    pub fn new(prefix: Option<&str>, column: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            column: column.to_string(),
            alias: None,
            coalesce: None,
        }
    }

    /// Sets the output alias.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Wraps the column in `COALESCE(column, default)`.
    #[must_use]
    pub fn coalesce(mut self, default: SqlValue) -> Self {
        self.coalesce = Some(default);
        self
    }

    /// Renders the projection.
    #[must_use]
    pub fn render(&self) -> String {
        let column = column_reference(self.prefix.as_deref(), &self.column);
        let expr = match &self.coalesce {
            Some(default) => format!("COALESCE({column}, {})", default.to_sql_inline()),
            None => column,
        };
        match &self.alias {
            Some(alias) => format!("{expr} AS {alias}"),
            None => expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain() {
        assert_eq!(SelectProjection::new(None, "name").render(), "`name`");
    }

    #[test]
    fn test_prefixed_alias() {
        let p = SelectProjection::new(Some("u"), "name").alias("user_name");
        assert_eq!(p.render(), "u.`name` AS user_name");
    }

    #[test]
    fn test_coalesce() {
        let p = SelectProjection::new(Some("o"), "total")
            .alias("total")
            .coalesce(SqlValue::Int(0));
        assert_eq!(p.render(), "COALESCE(o.`total`, 0) AS total");
    }
}
