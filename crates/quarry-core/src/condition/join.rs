use crate::value::SqlValue;

use super::{column_reference, quote_table};

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL OUTER JOIN`
    Full,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL OUTER JOIN",
        }
    }
}

/// Extra `AND alias.column = 'literal'` on a join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinFilter {
    /// Table alias or name the column belongs to.
    pub alias: String,
    /// Column name.
    pub column: String,
    /// Literal, escaped inline.
    pub value: SqlValue,
}

impl JoinFilter {
    /// Creates a join filter.
    #[must_use]
    pub fn new(alias: &str, column: &str, value: SqlValue) -> Self {
        Self {
            alias: alias.to_string(),
            column: column.to_string(),
            value,
        }
    }
}

/// `<JOIN> primary [AS alias] ON primary.column = foreign.column`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPredicate {
    /// Join type.
    pub kind: JoinKind,
    /// Table being joined in.
    pub primary_table: String,
    /// Alias for the joined table.
    pub alias: Option<String>,
    /// Column of the joined table.
    pub primary_column: String,
    /// Table already in scope.
    pub foreign_table: String,
    /// Column of the table already in scope.
    pub foreign_column: String,
    /// Optional literal filter.
    pub filter: Option<JoinFilter>,
}

impl JoinPredicate {
    /// Renders the join clause.
    #[must_use]
    pub fn render(&self) -> String {
        let table = quote_table(&self.primary_table);
        let (head, reference) = match &self.alias {
            Some(alias) => (format!("{table} AS {alias}"), alias.clone()),
            None => (table.clone(), table),
        };
        let mut sql = format!(
            "{} {head} ON {} = {}",
            self.kind.as_sql(),
            column_reference(Some(&reference), &self.primary_column),
            column_reference(Some(&quote_table(&self.foreign_table)), &self.foreign_column),
        );
        if let Some(filter) = &self.filter {
            sql.push_str(&format!(
                " AND {} = {}",
                column_reference(Some(&filter.alias), &filter.column),
                filter.value.to_sql_inline()
            ));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(kind: JoinKind, alias: Option<&str>) -> JoinPredicate {
        JoinPredicate {
            kind,
            primary_table: String::from("users"),
            alias: alias.map(str::to_string),
            primary_column: String::from("id"),
            foreign_table: String::from("orders"),
            foreign_column: String::from("user_id"),
            filter: None,
        }
    }

    #[test]
    fn test_left_join_with_alias() {
        assert_eq!(
            join(JoinKind::Left, Some("u")).render(),
            "LEFT JOIN `users` AS u ON u.`id` = `orders`.`user_id`"
        );
    }

    #[test]
    fn test_inner_join_without_alias() {
        assert_eq!(
            join(JoinKind::Inner, None).render(),
            "INNER JOIN `users` ON `users`.`id` = `orders`.`user_id`"
        );
    }

    #[test]
    fn test_filter_literal_is_escaped() {
        let mut j = join(JoinKind::Full, Some("u"));
        j.filter = Some(JoinFilter::new(
            "u",
            "kind",
            SqlValue::Text(String::from("o'k")),
        ));
        assert_eq!(
            j.render(),
            "FULL OUTER JOIN `users` AS u ON u.`id` = `orders`.`user_id` AND u.`kind` = 'o''k'"
        );
    }
}
