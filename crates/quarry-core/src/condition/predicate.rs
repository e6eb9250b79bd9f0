use crate::value::SqlValue;

use super::column_reference;

/// Shape of a WHERE predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    /// `column <op> ?`
    Compare {
        /// Comparison operator, such as `=` or `>=`.
        operator: String,
        /// Bound value.
        value: SqlValue,
    },
    /// `column IS NULL`
    IsNull,
    /// `column IS NOT NULL`
    IsNotNull,
    /// `column IN (?, ...)` over string-coerced values.
    In(Vec<String>),
}

/// A single WHERE predicate. Predicates of a descriptor are joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct WherePredicate {
    prefix: Option<String>,
    column: String,
    kind: PredicateKind,
}

impl WherePredicate {
    /// Comparison predicate.
    ///
    /// A NULL value with `=` becomes `IS NULL`, and with `!=` or `<>`
    /// becomes `IS NOT NULL`; neither binds anything.
    #[must_use]
    pub fn compare(
        prefix: Option<&str>,
        column: &str,
        operator: &str,
        value: SqlValue,
    ) -> Self {
        let operator = operator.trim();
        let kind = match (&value, operator) {
            (SqlValue::Null, "=") => PredicateKind::IsNull,
            (SqlValue::Null, "!=" | "<>") => PredicateKind::IsNotNull,
            _ => PredicateKind::Compare {
                operator: operator.to_string(),
                value,
            },
        };
        Self::with_kind(prefix, column, kind)
    }

    /// Predicate with an explicit kind.
    #[must_use]
    pub fn with_kind(prefix: Option<&str>, column: &str, kind: PredicateKind) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            column: column.to_string(),
            kind,
        }
    }

    /// Column name, unquoted.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Predicate kind.
    #[must_use]
    pub const fn kind(&self) -> &PredicateKind {
        &self.kind
    }

    /// Renders the predicate with `?` placeholders.
    #[must_use]
    pub fn render(&self) -> String {
        let column = column_reference(self.prefix.as_deref(), &self.column);
        match &self.kind {
            PredicateKind::Compare { operator, .. } => format!("{column} {operator} ?"),
            PredicateKind::IsNull => format!("{column} IS NULL"),
            PredicateKind::IsNotNull => format!("{column} IS NOT NULL"),
            // An empty list matches nothing.
            PredicateKind::In(values) if values.is_empty() => String::from("1 = 0"),
            PredicateKind::In(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{column} IN ({placeholders})")
            }
        }
    }

    /// Appends the values bound by [`render`](Self::render), in placeholder order.
    pub fn collect_values(&self, out: &mut Vec<SqlValue>) {
        match &self.kind {
            PredicateKind::Compare { value, .. } => out.push(value.clone()),
            PredicateKind::In(values) => {
                out.extend(values.iter().cloned().map(SqlValue::Text));
            }
            PredicateKind::IsNull | PredicateKind::IsNotNull => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(predicate: &WherePredicate) -> Vec<SqlValue> {
        let mut out = Vec::new();
        predicate.collect_values(&mut out);
        out
    }

    #[test]
    fn test_compare() {
        let p = WherePredicate::compare(None, "age", ">", SqlValue::Int(1));
        assert_eq!(p.render(), "`age` > ?");
        assert_eq!(values(&p), vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_prefixed_compare() {
        let p = WherePredicate::compare(Some("u"), "id", "=", SqlValue::Int(3));
        assert_eq!(p.render(), "u.`id` = ?");
    }

    #[test]
    fn test_null_equality_becomes_is_null() {
        let p = WherePredicate::compare(None, "deleted_at", "=", SqlValue::Null);
        assert_eq!(p.render(), "`deleted_at` IS NULL");
        assert!(values(&p).is_empty());

        let p = WherePredicate::compare(None, "deleted_at", "<>", SqlValue::Null);
        assert_eq!(p.render(), "`deleted_at` IS NOT NULL");
        assert!(values(&p).is_empty());
    }

    #[test]
    fn test_in_list() {
        let p = WherePredicate::with_kind(
            None,
            "id",
            PredicateKind::In(vec![String::from("1"), String::from("2")]),
        );
        assert_eq!(p.render(), "`id` IN (?, ?)");
        assert_eq!(
            values(&p),
            vec![
                SqlValue::Text(String::from("1")),
                SqlValue::Text(String::from("2"))
            ]
        );
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let p = WherePredicate::with_kind(None, "id", PredicateKind::In(Vec::new()));
        assert_eq!(p.render(), "1 = 0");
    }
}
