//! [`FieldType`] for the standard field types.
//!
//! | Rust type | Column |
//! |---|---|
//! | `i64`, `i32`, `i16`, `u32` | `BIGINT` |
//! | `bool` | `BOOLEAN` |
//! | `f64`, `f32`, `Decimal` | `DECIMAL(65,30)`, stored as `TEXT` on SQLite |
//! | `String` | `VARCHAR(255)` |
//! | `Uuid` | `VARCHAR(36)` |
//! | `NaiveDateTime`, `DateTime<Utc>` | `TIMESTAMP NULL` |
//! | `serde_json::Value` | `JSON` |
//! | `Vec<u8>`, `Serialized<T>` | `BLOB` |
//! | `Option<T>` | as `T`, nullable |

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{FieldContext, FieldType};
use crate::blob::{self, BlobType, Serialized};
use crate::error::Result;
use crate::schema::{ColumnBuilder, Schema};
use crate::value::{SqlValue, ToSqlValue, TIMESTAMP_FORMAT};

impl<T: FieldType> FieldType for Option<T> {
    const NULLABLE: bool = true;

    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        T::declare(schema, column).nullable()
    }

    fn to_sql(&self) -> Result<SqlValue> {
        self.as_ref().map_or(Ok(SqlValue::Null), T::to_sql)
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            value => T::from_sql(value, ctx).map(Some),
        }
    }
}

impl FieldType for i64 {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.big_int(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Int(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Int(n) => Ok(n),
            SqlValue::Bool(b) => Ok(i64::from(b)),
            // REAL results of integer arithmetic, such as SUM over a DECIMAL column.
            SqlValue::Float(f) if f.fract() == 0.0 => Ok(f as i64),
            other => {
                let text = other.to_text();
                text.trim()
                    .parse()
                    .map_err(|e| ctx.conversion(format!("`{text}` is not an integer: {e}")))
            }
        }
    }
}

macro_rules! narrow_int_field {
    ($($ty:ty),*) => {
        $(
            impl FieldType for $ty {
                fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
                    schema.big_int(column)
                }

                fn to_sql(&self) -> Result<SqlValue> {
                    Ok(SqlValue::Int(i64::from(*self)))
                }

                fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
                    let wide = i64::from_sql(value, ctx)?;
                    <$ty>::try_from(wide).map_err(|e| ctx.conversion(e.to_string()))
                }
            }
        )*
    };
}

narrow_int_field!(i32, i16, u32, u16);

impl FieldType for bool {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.boolean(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Bool(*self))
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        Ok(match ctx.present(value)? {
            SqlValue::Bool(b) => b,
            SqlValue::Int(n) => n == 1,
            other => {
                let text = other.to_text();
                text.eq_ignore_ascii_case("true") || text == "1"
            }
        })
    }
}

impl FieldType for f64 {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.decimal(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Float(*self))
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as f64),
            other => {
                let text = other.to_text();
                text.trim()
                    .parse()
                    .map_err(|e| ctx.conversion(format!("`{text}` is not a number: {e}")))
            }
        }
    }
}

impl FieldType for f32 {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.decimal(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Float(f64::from(*self)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        f64::from_sql(value, ctx).map(|f| f as f32)
    }
}

impl FieldType for Decimal {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.decimal(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(self.to_sql_value())
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Int(n) => Ok(Self::from(n)),
            SqlValue::Float(f) => Self::try_from(f).map_err(|e| ctx.conversion(e.to_string())),
            other => {
                let text = other.to_text();
                let text = text.trim();
                Self::from_str(text)
                    .or_else(|_| Self::from_scientific(text))
                    .map_err(|e| ctx.conversion(format!("`{text}` is not a decimal: {e}")))
            }
        }
    }
}

impl FieldType for String {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.string(column, 255)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Text(self.clone()))
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Blob(bytes) => {
                Self::from_utf8(bytes).map_err(|e| ctx.conversion(e.to_string()))
            }
            other => Ok(other.to_text()),
        }
    }
}

impl FieldType for Uuid {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.uuid(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(self.to_sql_value())
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        let text = String::from_sql(value, ctx)?;
        Self::parse_str(text.trim()).map_err(|e| ctx.conversion(e.to_string()))
    }
}

/// Parses the fixed layout, fractional seconds, or RFC 3339.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

impl FieldType for NaiveDateTime {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.timestamp(column).nullable()
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(self.to_sql_value())
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Int(millis) => DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| ctx.conversion(format!("{millis} is out of range"))),
            other => {
                let text = other.to_text();
                parse_timestamp(text.trim())
                    .ok_or_else(|| ctx.conversion(format!("`{text}` is not a timestamp")))
            }
        }
    }
}

impl FieldType for DateTime<Utc> {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        NaiveDateTime::declare(schema, column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(self.to_sql_value())
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        NaiveDateTime::from_sql(value, ctx).map(|dt| dt.and_utc())
    }
}

impl FieldType for serde_json::Value {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.json(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(self.to_sql_value())
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        Ok(match ctx.present(value)? {
            SqlValue::Text(s) => serde_json::from_str(&s)?,
            SqlValue::Blob(bytes) => serde_json::from_slice(&bytes)?,
            SqlValue::Int(n) => Self::from(n),
            SqlValue::Float(f) => Self::from(f),
            SqlValue::Bool(b) => Self::from(b),
            SqlValue::Null => Self::Null,
        })
    }
}

impl FieldType for Vec<u8> {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.blob(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        Ok(SqlValue::Blob(self.clone()))
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        match ctx.present(value)? {
            SqlValue::Blob(bytes) => Ok(bytes),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(ctx.conversion(format!("expected bytes, found {other:?}"))),
        }
    }
}

impl<T: BlobType> FieldType for Serialized<T> {
    fn declare<'s>(schema: &'s mut Schema, column: &str) -> ColumnBuilder<'s> {
        schema.blob(column)
    }

    fn to_sql(&self) -> Result<SqlValue> {
        blob::encode(&self.0).map(SqlValue::Blob)
    }

    fn from_sql(value: SqlValue, ctx: &FieldContext<'_>) -> Result<Self> {
        let bytes = Vec::<u8>::from_sql(value, ctx)?;
        blob::decode(&bytes, ctx.allow_list).map(Serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::AllowList;
    use crate::error::Error;
    use crate::schema::SchemaKind;
    use crate::types::SqlType;

    fn convert<T: FieldType>(value: SqlValue) -> Result<T> {
        let allow = AllowList::default();
        T::from_sql(
            value,
            &FieldContext {
                column: "c",
                allow_list: &allow,
            },
        )
    }

    fn declared<T: FieldType>() -> (SqlType, bool) {
        let mut schema = Schema::new("t", SchemaKind::Create);
        let column = T::declare(&mut schema, "c");
        let definition = column.definition();
        (definition.sql_type, definition.nullable)
    }

    #[test]
    fn test_inferred_types() {
        assert_eq!(declared::<i32>(), (SqlType::BigInt, false));
        assert_eq!(declared::<bool>(), (SqlType::Boolean, false));
        assert_eq!(declared::<f64>(), (SqlType::Decimal(65, 30), false));
        assert_eq!(declared::<String>(), (SqlType::Varchar(255), false));
        assert_eq!(declared::<Uuid>(), (SqlType::Varchar(36), false));
        assert_eq!(declared::<NaiveDateTime>(), (SqlType::Timestamp, true));
        assert_eq!(declared::<Option<i64>>(), (SqlType::BigInt, true));
        assert_eq!(declared::<Vec<u8>>(), (SqlType::Blob, false));
    }

    #[test]
    fn test_bool_from_text_and_int() {
        assert!(convert::<bool>(SqlValue::Text(String::from("TRUE"))).unwrap());
        assert!(convert::<bool>(SqlValue::Text(String::from("1"))).unwrap());
        assert!(convert::<bool>(SqlValue::Int(1)).unwrap());
        assert!(!convert::<bool>(SqlValue::Int(0)).unwrap());
    }

    #[test]
    fn test_integer_from_text() {
        assert_eq!(convert::<i64>(SqlValue::Text(String::from("42"))).unwrap(), 42);
        assert!(matches!(
            convert::<i64>(SqlValue::Text(String::from("x"))),
            Err(Error::Conversion { .. })
        ));
    }

    #[test]
    fn test_narrow_integer_overflow() {
        assert!(convert::<i16>(SqlValue::Int(1 << 20)).is_err());
        assert!(convert::<u16>(SqlValue::Int(-1)).is_err());
        assert_eq!(convert::<u16>(SqlValue::Int(7)).unwrap(), 7);
    }

    #[test]
    fn test_decimal_from_each_storage() {
        let expected = Decimal::new(125, 1);
        assert_eq!(convert::<Decimal>(SqlValue::Float(12.5)).unwrap(), expected);
        assert_eq!(
            convert::<Decimal>(SqlValue::Text(String::from("12.50"))).unwrap(),
            expected
        );
        assert_eq!(convert::<Decimal>(SqlValue::Int(3)).unwrap(), Decimal::from(3));
    }

    #[test]
    fn test_timestamp_from_text_and_millis() {
        let expected =
            NaiveDateTime::parse_from_str("2024-01-02 03:04:05", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(
            convert::<NaiveDateTime>(SqlValue::Text(String::from("2024-01-02 03:04:05")))
                .unwrap(),
            expected
        );
        let millis = expected.and_utc().timestamp_millis();
        assert_eq!(convert::<NaiveDateTime>(SqlValue::Int(millis)).unwrap(), expected);
        assert_eq!(
            convert::<NaiveDateTime>(SqlValue::Text(String::from("2024-01-02T03:04:05Z")))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_uuid_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(convert::<Uuid>(id.to_sql().unwrap()).unwrap(), id);
    }

    #[test]
    fn test_null_into_required_field() {
        assert!(matches!(
            convert::<String>(SqlValue::Null),
            Err(Error::UnexpectedNull(_))
        ));
        assert_eq!(convert::<Option<String>>(SqlValue::Null).unwrap(), None);
    }

    #[test]
    fn test_serialized_respects_allow_list() {
        let value = Serialized(vec![String::from("a")]);
        let stored = value.to_sql().unwrap();
        assert_eq!(convert::<Serialized<Vec<String>>>(stored).unwrap(), value);

        let allow = AllowList::empty();
        let result = Serialized::<Vec<String>>::from_sql(
            value.to_sql().unwrap(),
            &FieldContext {
                column: "c",
                allow_list: &allow,
            },
        );
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }
}
