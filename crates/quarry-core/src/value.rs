//! Bound parameter values.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Text layout used for timestamps bound as parameters and read back from rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value bound to a `?` placeholder, or carried by a column descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Renders the value as an escaped SQL literal.
    ///
    /// Only used where a literal must appear in the statement text, such as
    /// join filters and coalesce defaults. Everything else is bound.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(true) => String::from("TRUE"),
            Self::Bool(false) => String::from("FALSE"),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Returns the textual form used when values are string-coerced,
    /// as in `IN` lists.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::from("null"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Conversion into a bindable [`SqlValue`].
pub trait ToSqlValue {
    /// Converts the value.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for Uuid {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSqlValue for Decimal {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        self.naive_utc().to_sql_value()
    }
}

impl ToSqlValue for &serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        (&self).to_sql_value()
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_text_doubles_quotes() {
        let value = SqlValue::Text(String::from("O'Brien"));
        assert_eq!(value.to_sql_inline(), "'O''Brien'");
    }

    #[test]
    fn test_inline_blob_is_hex() {
        let value = SqlValue::Blob(vec![0xDE, 0xAD]);
        assert_eq!(value.to_sql_inline(), "X'DEAD'");
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(None::<i64>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(4_i32).to_sql_value(), SqlValue::Int(4));
    }

    #[test]
    fn test_timestamp_uses_fixed_layout() {
        let ts = NaiveDateTime::parse_from_str("2024-03-01 08:30:00", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(
            ts.to_sql_value(),
            SqlValue::Text(String::from("2024-03-01 08:30:00"))
        );
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(SqlValue::Int(7).to_text(), "7");
        assert_eq!(SqlValue::Bool(true).to_text(), "true");
        assert_eq!(SqlValue::Text(String::from("x")).to_text(), "x");
    }
}
