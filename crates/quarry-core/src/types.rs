//! Column type tags.

use std::fmt;
use std::str::FromStr;

/// Default precision and scale for `DECIMAL` columns.
pub const DEFAULT_DECIMAL: (u8, u8) = (65, 30);

/// SQL data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// `VARCHAR(n)`.
    Varchar(u32),
    /// `TEXT`.
    Text,
    /// `LONGTEXT`.
    LongText,
    /// `INT`.
    Integer,
    /// `BIGINT`.
    BigInt,
    /// `DECIMAL(precision, scale)`.
    Decimal(u8, u8),
    /// `BOOLEAN`.
    Boolean,
    /// `JSON`.
    Json,
    /// `BLOB`.
    Blob,
    /// `TIMESTAMP`.
    Timestamp,
    /// `DATE`.
    Date,
}

impl SqlType {
    /// Type used for UUID columns.
    pub const UUID: Self = Self::Varchar(36);

    /// Returns true for integer types that may auto-increment.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::BigInt)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Varchar(len) => write!(f, "VARCHAR({len})"),
            Self::Text => f.write_str("TEXT"),
            Self::LongText => f.write_str("LONGTEXT"),
            Self::Integer => f.write_str("INT"),
            Self::BigInt => f.write_str("BIGINT"),
            Self::Decimal(precision, scale) => write!(f, "DECIMAL({precision},{scale})"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Json => f.write_str("JSON"),
            Self::Blob => f.write_str("BLOB"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Date => f.write_str("DATE"),
        }
    }
}

impl FromStr for SqlType {
    type Err = String;

    /// Parses names such as `varchar(50)`, `decimal(10,2)`, `bigint` or `uuid`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, args) = match lower.split_once('(') {
            Some((name, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| format!("unbalanced parentheses in `{s}`"))?;
                (name.trim(), Some(args))
            }
            None => (lower.as_str(), None),
        };
        let numbers = args
            .map(|args| {
                args.split(',')
                    .map(|n| n.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| format!("bad type argument in `{s}`: {e}"))
            })
            .transpose()?
            .unwrap_or_default();

        let ty = match (name, numbers.as_slice()) {
            ("varchar" | "string", []) => Self::Varchar(255),
            ("varchar" | "string", [len]) => Self::Varchar(*len),
            ("text", []) => Self::Text,
            ("longtext", []) => Self::LongText,
            ("int" | "integer", []) => Self::Integer,
            ("bigint" | "long", []) => Self::BigInt,
            ("decimal", []) => Self::Decimal(DEFAULT_DECIMAL.0, DEFAULT_DECIMAL.1),
            ("decimal", [precision, scale]) => Self::Decimal(
                u8::try_from(*precision).map_err(|e| e.to_string())?,
                u8::try_from(*scale).map_err(|e| e.to_string())?,
            ),
            ("boolean" | "bool", []) => Self::Boolean,
            ("json", []) => Self::Json,
            ("blob", []) => Self::Blob,
            ("timestamp", []) => Self::Timestamp,
            ("date", []) => Self::Date,
            ("uuid", []) => Self::UUID,
            _ => return Err(format!("unknown SQL type `{s}`")),
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SqlType::Varchar(50).to_string(), "VARCHAR(50)");
        assert_eq!(SqlType::Decimal(65, 30).to_string(), "DECIMAL(65,30)");
        assert_eq!(SqlType::BigInt.to_string(), "BIGINT");
    }

    #[test]
    fn test_parse() {
        assert_eq!("varchar(50)".parse(), Ok(SqlType::Varchar(50)));
        assert_eq!("DECIMAL(10, 2)".parse(), Ok(SqlType::Decimal(10, 2)));
        assert_eq!("uuid".parse(), Ok(SqlType::Varchar(36)));
        assert_eq!("string".parse(), Ok(SqlType::Varchar(255)));
        assert!("geometry".parse::<SqlType>().is_err());
        assert!("varchar(50".parse::<SqlType>().is_err());
    }
}
